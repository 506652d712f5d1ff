// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands, their arguments and conversion into commands.

use clap::{ArgAction, Args, Parser, Subcommand};
use containmint::commands::{Build, BuildOptions, Command, Dispatch, Execute, Merge, SquashMode};
use containmint::error::{Error, Result};
use containmint::remote::{Arch, RemoteTarget, current_program};
use containmint::types::{BuildContext, ImageReference, TAG_FORMAT};
use nonempty::NonEmpty;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "containmint")]
#[command(about = "Create multi-arch containers using native cloud builds")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and push an image using a remote instance
    Build {
        #[command(flatten)]
        build: BuildArgs,

        /// Keep the remote instance
        #[arg(long)]
        keep_instance: bool,

        /// ansible-test remote target args
        #[arg(long, default_value = "rhel/9.0")]
        remote: String,

        /// Architecture
        #[arg(long, value_enum, default_value_t = Arch::X86_64)]
        arch: Arch,

        /// containmint executable to run on the remote instance (defaults to this one)
        #[arg(long)]
        program: Option<PathBuf>,
    },

    /// Create and push a manifest list
    Merge {
        /// Manifest list tag: {server}/{repo}:{tag}
        #[arg(long = "tag", value_name = "TAG", required = true, value_parser = image_ref)]
        tags: Vec<ImageReference>,

        /// Push the manifest
        #[arg(long)]
        push: bool,

        /// Do not log in
        #[arg(long = "no-login", action = ArgAction::SetFalse)]
        login: bool,

        /// Source image tags: {server}/{repo}:{tag}
        #[arg(value_name = "SOURCE", required = true, value_parser = image_ref)]
        sources: Vec<ImageReference>,
    },

    /// Execute a local build and push (internal use only)
    #[command(hide = true)]
    Execute {
        #[command(flatten)]
        build: BuildArgs,
    },

    /// Execute a local build and push using a config file (internal use only)
    #[command(hide = true)]
    Dispatch,
}

/// Arguments shared by `build` and `execute`.
#[derive(Args)]
pub struct BuildArgs {
    /// Image tag: {server}/{repo}:{tag}
    #[arg(long, value_parser = image_ref)]
    tag: ImageReference,

    /// Path to the build context
    #[arg(long, default_value = ".", value_parser = context_ref)]
    context: PathBuf,

    /// Push the image
    #[arg(long)]
    push: bool,

    /// Do not log in
    #[arg(long = "no-login", action = ArgAction::SetFalse)]
    login: bool,

    /// Squash to a single layer
    #[arg(long, value_enum)]
    squash: Option<SquashMode>,
}

impl From<BuildArgs> for BuildOptions {
    fn from(args: BuildArgs) -> Self {
        BuildOptions {
            context: args.context,
            tag: args.tag,
            push: args.push,
            login: args.login,
            squash: args.squash,
        }
    }
}

fn image_ref(value: &str) -> std::result::Result<ImageReference, String> {
    ImageReference::parse(value).map_err(|_| format!("required format is: {TAG_FORMAT}"))
}

fn context_ref(value: &str) -> std::result::Result<PathBuf, String> {
    BuildContext::locate(value)
        .map(|_| PathBuf::from(value))
        .map_err(|e| e.to_string())
}

impl Commands {
    /// Resolve parsed arguments into a runnable command.
    pub fn into_command(self) -> Result<Command> {
        match self {
            Commands::Build {
                build,
                keep_instance,
                remote,
                arch,
                program,
            } => {
                let program = match program {
                    Some(program) => program,
                    None => current_program()?,
                };
                Ok(Command::Build(Build::new(
                    build.into(),
                    RemoteTarget::new(remote, arch),
                    keep_instance,
                    program,
                )))
            }
            Commands::Merge {
                tags,
                push,
                login,
                sources,
            } => {
                let tags = NonEmpty::from_vec(tags)
                    .ok_or_else(|| Error::Configuration("at least one tag is required".into()))?;
                let sources = NonEmpty::from_vec(sources)
                    .ok_or_else(|| Error::Configuration("at least one source is required".into()))?;
                Ok(Command::Merge(Merge::new(tags, sources, push, login)))
            }
            Commands::Execute { build } => Ok(Command::Execute(Execute::resolve(build.into(), None)?)),
            Commands::Dispatch => Ok(Command::Dispatch(Dispatch::new()?)),
        }
    }
}
