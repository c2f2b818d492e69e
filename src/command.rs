//! Command assembly — configuration and caller input to a full argv.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::args::{
    classify, domain_controls, standalone_controls, Argument, ArgumentCollection, ArgumentKind,
    ClassifiedToken, ControlDef, ControlToken,
};
use crate::config::{ConfigError, Configuration, KeyOrder};
use crate::env::{options_from_env, Environment, JAVA_HOME, SERVER_HOME};

/// Configuration namespace for system properties (`sys.<name>`).
const SYSTEM_PROPERTY_PREFIX: &str = "sys";
/// Configuration namespace for raw runtime options (`jvm.option.<n>`).
const JVM_OPTION_PREFIX: &str = "jvm.option";
/// Configuration namespace for server arguments (`arg.<name>`).
const SERVER_ARGUMENT_PREFIX: &str = "arg";
/// Configuration key for an alternate runtime home.
const CONFIG_JAVA_HOME_KEY: &str = "env.JAVA_HOME";

/// Secondary per-role override variable consumed by the domain topology.
const HOST_CONTROLLER_JAVA_OPTS: &str = "HOST_CONTROLLER_JAVA_OPTS";

/// Runtime option appended by the `--debug` control token: a debug listener
/// on the conventional port, started without suspending the runtime.
const DEBUG_OPTION: &str =
    "-agentlib:jdwp=transport=dt_socket,address=8787,server=y,suspend=n";

/// Server argument appended when security-manager mode is enabled.
const SECURITY_MANAGER_ARGUMENT: &str = "-secmgr";

#[cfg(windows)]
const JAVA_EXECUTABLE: &str = "java.exe";
#[cfg(not(windows))]
const JAVA_EXECUTABLE: &str = "java";

/// Errors resolving a launchable command. Raised before any process is
/// spawned.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Runtime executable '{path}' does not exist")]
    JavaCommandNotFound { path: PathBuf },
}

/// Topology variant being launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    Standalone,
    Domain,
}

impl ServerMode {
    /// Properties file consumed by this topology, under `bin/`.
    pub fn properties_file(&self) -> &'static str {
        match self {
            ServerMode::Standalone => "standalone.properties",
            ServerMode::Domain => "domain.properties",
        }
    }

    /// Primary options-override environment variable.
    pub fn options_override_var(&self) -> &'static str {
        match self {
            ServerMode::Standalone => "JAVA_OPTS",
            ServerMode::Domain => "PROCESS_CONTROLLER_JAVA_OPTS",
        }
    }

    /// Marker system property identifying the process on its own command
    /// line.
    fn marker_option(&self) -> &'static str {
        match self {
            ServerMode::Standalone => "-D[Standalone]",
            ServerMode::Domain => "-D[Process Controller]",
        }
    }

    /// Bootstrap jar launched for this topology, under `bin/`.
    fn bootstrap_jar(&self) -> &'static str {
        match self {
            ServerMode::Standalone => "standalone.jar",
            ServerMode::Domain => "process-controller.jar",
        }
    }

    /// Control tokens recognized when scanning caller tokens.
    pub fn controls(&self) -> &'static [ControlDef] {
        match self {
            ServerMode::Standalone => standalone_controls(),
            ServerMode::Domain => domain_controls(),
        }
    }
}

/// Ready-to-launch invocation produced by [`CommandBuilder::build`].
#[derive(Debug, Clone)]
pub struct CommandLine {
    /// Resolved runtime executable.
    pub command: PathBuf,
    /// Arguments passed to the executable, in final order.
    pub args: Vec<String>,
    /// Variables merged into the child environment, overriding inherited
    /// values of the same name.
    pub env: Vec<(String, String)>,
    /// Installation root, for operator-facing reporting.
    pub home: PathBuf,
    /// Effective runtime options, for operator-facing reporting.
    pub options: Vec<String>,
}

/// Assembles the full argv for one server launch.
///
/// Precedence: a non-empty options-override list fully replaces the
/// configuration-derived `sys.*` and `jvm.option.*` entries (exclusive, not
/// a merge); configuration `arg.*` entries precede caller-supplied server
/// tokens; caller tokens beginning with `-D` are routed to the option list
/// even when mixed among positional server arguments.
#[derive(Debug)]
pub struct CommandBuilder {
    mode: ServerMode,
    environment: Environment,
    configuration: Configuration,
    java_home: Option<PathBuf>,
    debug: bool,
    use_security_manager: bool,
    options_override: Vec<String>,
    host_controller_options: Vec<String>,
    extra_options: ArgumentCollection,
    server_arguments: ArgumentCollection,
}

impl CommandBuilder {
    pub fn new(mode: ServerMode, environment: Environment, configuration: Configuration) -> Self {
        Self {
            mode,
            environment,
            configuration,
            java_home: None,
            debug: false,
            use_security_manager: false,
            options_override: Vec::new(),
            host_controller_options: Vec::new(),
            extra_options: ArgumentCollection::new(),
            server_arguments: ArgumentCollection::new(),
        }
    }

    /// Build a fully-configured builder for `mode`: load the topology's
    /// properties file, scan the caller tokens, and pick up the override
    /// environment variables.
    pub fn configure(
        mode: ServerMode,
        environment: Environment,
        tokens: &[String],
    ) -> Result<Self, ConfigError> {
        let properties = environment.resolve_path(["bin", mode.properties_file()]);
        let configuration = Configuration::of(&properties)?;
        let mut builder = Self::new(mode, environment, configuration);
        builder.add_java_option(mode.marker_option());
        for classified in classify(tokens, mode.controls()) {
            match classified {
                ClassifiedToken::Control(ControlToken::Debug) => {
                    builder.set_debug(true);
                }
                ClassifiedToken::Control(ControlToken::SecurityManager) => {
                    builder.set_use_security_manager(true);
                }
                ClassifiedToken::Forward(token) => {
                    builder.add_server_argument(&token);
                }
            }
        }
        builder.set_java_options_override(options_from_env(mode.options_override_var()));
        if mode == ServerMode::Domain {
            builder.set_host_controller_options(options_from_env(HOST_CONTROLLER_JAVA_OPTS));
        }
        Ok(builder)
    }

    /// Enable the runtime debug listener.
    pub fn set_debug(&mut self, enabled: bool) -> &mut Self {
        self.debug = enabled;
        self
    }

    /// Enable security-manager mode on the launched server.
    pub fn set_use_security_manager(&mut self, enabled: bool) -> &mut Self {
        self.use_security_manager = enabled;
        self
    }

    /// Explicit alternate runtime home; beats every other resolution source.
    pub fn set_java_home(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.java_home = Some(path.into());
        self
    }

    /// Add a runtime option on top of whatever the configuration or the
    /// override variable contributes. Empty tokens are ignored.
    pub fn add_java_option(&mut self, option: &str) -> &mut Self {
        if !option.is_empty() {
            self.extra_options.add_raw(option);
        }
        self
    }

    pub fn add_java_options<I, S>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for option in options {
            self.add_java_option(option.as_ref());
        }
        self
    }

    /// Exclusive override for the configuration-derived option categories.
    /// When non-empty, `sys.*` and `jvm.option.*` configuration entries are
    /// ignored entirely.
    pub fn set_java_options_override(&mut self, tokens: Vec<String>) -> &mut Self {
        self.options_override = tokens;
        self
    }

    /// Options forwarded to the host controllers spawned by the launched
    /// process controller (domain topology only).
    pub fn set_host_controller_options(&mut self, tokens: Vec<String>) -> &mut Self {
        self.host_controller_options = tokens;
        self
    }

    /// Append a server argument. Tokens beginning with `-D` are treated as
    /// runtime options even when mixed among positional server arguments.
    /// Empty tokens are ignored.
    pub fn add_server_argument(&mut self, token: &str) -> &mut Self {
        if token.is_empty() {
            return self;
        }
        let argument = Argument::parse(token);
        if argument.kind() == ArgumentKind::SystemProperty {
            self.extra_options.add(argument);
        } else {
            self.server_arguments.add(argument);
        }
        self
    }

    pub fn add_server_arguments<I, S>(&mut self, tokens: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            self.add_server_argument(token.as_ref());
        }
        self
    }

    /// Produce the final invocation. Fails only when the runtime executable
    /// cannot be located.
    pub fn build(&self) -> Result<CommandLine, BuildError> {
        let java_home = self.resolved_java_home();
        let command = self.resolve_java_command(java_home.as_deref())?;
        let options = self.assemble_options();
        let server_args = self.assemble_server_arguments();
        let bootstrap = self
            .environment
            .resolve_path(["bin", self.mode.bootstrap_jar()]);

        let rendered_options = options.render();
        let mut args = rendered_options.clone();
        args.push("-jar".to_string());
        args.push(bootstrap.display().to_string());
        if self.mode == ServerMode::Domain {
            args.push("--".to_string());
            args.extend(self.host_controller_options.iter().cloned());
            args.push("--".to_string());
        }
        args.extend(server_args.render());

        let mut env = vec![(
            SERVER_HOME.to_string(),
            self.environment.home().display().to_string(),
        )];
        if let Some(java_home) = java_home {
            env.push((JAVA_HOME.to_string(), java_home.display().to_string()));
        }

        Ok(CommandLine {
            command,
            args,
            env,
            home: self.environment.home().to_path_buf(),
            options: rendered_options,
        })
    }

    /// Runtime options for this launch: the exclusive override when set,
    /// otherwise configuration `sys.*` then `jvm.option.*`; caller-supplied
    /// options land on top either way.
    fn assemble_options(&self) -> ArgumentCollection {
        let mut options = ArgumentCollection::new();
        if self.options_override.is_empty() {
            for (name, value) in self
                .configuration
                .get(SYSTEM_PROPERTY_PREFIX, KeyOrder::FirstSeen)
            {
                options.add(Argument::system_property(&name, Some(&value)));
            }
            for (_name, token) in self
                .configuration
                .get(JVM_OPTION_PREFIX, KeyOrder::Lexicographic)
            {
                options.add_raw(&token);
            }
        } else {
            tracing::info!(
                var = self.mode.options_override_var(),
                "options override variable is set; ignoring configured sys.* and jvm.option.* entries"
            );
            options.add_all(&self.options_override);
        }
        for argument in self.extra_options.iter() {
            options.add(argument.clone());
        }
        if self.debug {
            options.add_raw(DEBUG_OPTION);
        }
        options
    }

    /// Server arguments: configuration `arg.*` entries first, then caller
    /// tokens, then the security-manager flag when enabled.
    fn assemble_server_arguments(&self) -> ArgumentCollection {
        let mut server_args = ArgumentCollection::new();
        for (name, value) in self
            .configuration
            .get(SERVER_ARGUMENT_PREFIX, KeyOrder::FirstSeen)
        {
            server_args.add(Argument::plain(&name, Some(&value)));
        }
        for argument in self.server_arguments.iter() {
            server_args.add(argument.clone());
        }
        if self.use_security_manager {
            server_args.add_raw(SECURITY_MANAGER_ARGUMENT);
        }
        server_args
    }

    /// Alternate runtime home: explicit override, then the configuration's
    /// `env.JAVA_HOME`, then the process environment.
    fn resolved_java_home(&self) -> Option<PathBuf> {
        if let Some(home) = &self.java_home {
            return Some(home.clone());
        }
        if let Some(home) = self.configuration.get_single_value(CONFIG_JAVA_HOME_KEY) {
            return Some(PathBuf::from(home));
        }
        self.environment.default_java_home().map(Path::to_path_buf)
    }

    /// Resolve the runtime executable. With a known home the executable must
    /// exist under `bin/`; with no home at all, a bare `java` is emitted and
    /// resolution is deferred to `PATH`.
    fn resolve_java_command(&self, java_home: Option<&Path>) -> Result<PathBuf, BuildError> {
        match java_home {
            Some(home) => {
                let path = home.join("bin").join(JAVA_EXECUTABLE);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(BuildError::JavaCommandNotFound { path })
                }
            }
            None => Ok(PathBuf::from(JAVA_EXECUTABLE)),
        }
    }
}
