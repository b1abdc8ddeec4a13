use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quelea")]
#[command(author, version, about)]
#[command(long_about = "Project song lyrics, bible passages and media to one or more screens.\n\n\
    Write the service order as a plain text schedule and drive the projectors\n\
    from a control window.\n\n\
    Examples:\n  \
    quelea service.txt                 Open the control window, projector fullscreen\n  \
    quelea service.txt --windowed      Show the projector in a window\n  \
    quelea service.txt --projectors 2  Drive two projector outputs\n  \
    quelea fit service.txt --item 3    Show how item 3 would be laid out")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Schedule file to open
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Show projector outputs in windows instead of fullscreen
    #[arg(long, global = false)]
    pub windowed: bool,

    /// Number of projector outputs
    #[arg(long, global = false)]
    pub projectors: Option<usize>,

    /// Start on a specific item (1-indexed)
    #[arg(long, global = false)]
    pub item: Option<usize>,

    /// Start on a specific section of that item (1-indexed)
    #[arg(long, global = false)]
    pub section: Option<usize>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the line breaks and font size chosen for each section
    Fit {
        /// Schedule file
        file: PathBuf,

        /// Only this item (1-indexed)
        #[arg(long)]
        item: Option<usize>,

        /// Canvas width in pixels
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Canvas height in pixels
        #[arg(long, default_value = "1080")]
        height: u32,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. display.max_chars, display.use_uniform_font_size)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Options for the control window.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub file: PathBuf,
    pub windowed: bool,
    pub projectors: usize,
    /// 0-indexed
    pub item: usize,
    /// 0-indexed
    pub section: usize,
}

impl Cli {
    /// Log level implied by `-v`/`-q`.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Fit {
                file,
                item,
                width,
                height,
            }) => {
                if !file.exists() {
                    anyhow::bail!("File not found: {}", file.display());
                }
                crate::commands::fit::run(&file, item, width, height)
            }
            Some(Commands::Version) => {
                crate::commands::version::run();
                Ok(())
            }
            None => {
                if let Some(file) = self.file {
                    if !file.exists() {
                        anyhow::bail!("File not found: {}", file.display());
                    }
                    let defaults = crate::config::Config::load_or_default()
                        .defaults
                        .unwrap_or_default();
                    let projectors = self.projectors.or(defaults.projectors).unwrap_or(1);
                    if projectors == 0 {
                        anyhow::bail!("--projectors must be at least 1");
                    }
                    crate::app::run(LaunchOptions {
                        file,
                        windowed: self.windowed || defaults.windowed.unwrap_or(false),
                        projectors,
                        item: self.item.unwrap_or(1).saturating_sub(1),
                        section: self.section.unwrap_or(1).saturating_sub(1),
                    })
                } else {
                    use clap::CommandFactory;
                    let mut cmd = Self::command();
                    cmd.print_help()?;
                    println!();
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_launch_flags() {
        let cli = Cli::try_parse_from([
            "quelea",
            "service.txt",
            "--windowed",
            "--projectors",
            "2",
            "--item",
            "3",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("service.txt")));
        assert!(cli.windowed);
        assert_eq!(cli.projectors, Some(2));
        assert_eq!(cli.item, Some(3));
        assert_eq!(cli.log_filter(), "trace");
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let cli = Cli::try_parse_from(["quelea", "-v", "-q", "version"]).unwrap();
        assert_eq!(cli.log_filter(), "warn");
    }

    #[test]
    fn test_fit_defaults() {
        let cli = Cli::try_parse_from(["quelea", "fit", "service.txt"]).unwrap();
        let Some(Commands::Fit {
            width, height, item, ..
        }) = cli.command
        else {
            panic!("expected fit");
        };
        assert_eq!((width, height, item), (1920, 1080, None));
    }
}
