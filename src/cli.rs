use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "spotta", version, about = "Workout session tracker")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open an interactive workout session
    #[command(visible_alias = "s")]
    Session,

    /// Browse workout templates
    #[command(subcommand, visible_alias = "t")]
    Template(TemplateCmd),

    /// Browse the exercise catalog
    #[command(subcommand, visible_alias = "ex")]
    Exercise(ExerciseCmd),

    /// Suggest the next set from the last one - Usage: suggest WEIGHT REPS
    Suggest {
        /// Weight lifted last time
        weight: f64,

        /// Reps done last time
        reps: u32,
    },

    /// View or edit spotta config
    #[command(subcommand)]
    Config(ConfigCmd),

    /// Inspect durable device flags
    #[command(subcommand)]
    Flag(FlagCmd),
}

//
// Commands
//

#[derive(Subcommand)]
pub enum TemplateCmd {
    /// List templates
    #[command(visible_alias = "l")]
    List {
        /// Only community templates
        #[arg(short, long)]
        community: bool,
    },

    /// Show a single template in detail
    #[command(visible_alias = "s")]
    Show {
        /// Template id
        template: String,
    },
}

#[derive(Subcommand)]
pub enum ExerciseCmd {
    /// List all exercises
    #[command(visible_alias = "l")]
    List {
        /// Filter by muscle group
        #[arg(short, long)]
        muscle: Option<String>,
    },

    /// Show detailed exercise information
    #[command(visible_alias = "s", trailing_var_arg = true)]
    Show {
        /// Exercise id or name
        exercise: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Put a key back to its default
    Unset { key: String },
}

#[derive(Subcommand)]
pub enum FlagCmd {
    /// Show whether a session has ever been finished
    Show,

    /// Forget that a session was finished
    Reset,
}

/// One line typed at the `spotta session` prompt.
#[derive(Parser)]
#[command(name = "session", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub cmd: ShellCmd,
}

#[derive(Subcommand)]
pub enum ShellCmd {
    /// Start a session with the given exercises
    #[command(override_usage = "start <EXERCISE>... [--name NAME]")]
    Start {
        /// Exercise ids or names
        #[arg(required = true)]
        exercises: Vec<String>,

        /// Session name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Start a session from a template
    #[command(visible_alias = "t")]
    Template { template: String },

    /// Show the current session
    #[command(visible_alias = "i")]
    Show,

    /// Edit a set - Usage: set EXERCISE SET [-w WEIGHT] [-r REPS]
    Set {
        /// Exercise index
        exercise: usize,

        /// Set number
        set: usize,

        #[arg(short, long)]
        weight: Option<f64>,

        #[arg(short, long)]
        reps: Option<u32>,
    },

    /// Complete a set and start resting - Usage: done EXERCISE [SET] [-w WEIGHT] [-r REPS]
    #[command(visible_alias = "d")]
    Done {
        /// Exercise index
        exercise: usize,

        /// Set number (defaults to the next unfinished set)
        set: Option<usize>,

        #[arg(short, long)]
        weight: Option<f64>,

        #[arg(short, long)]
        reps: Option<u32>,
    },

    /// Append a set to an exercise
    AddSet { exercise: usize },

    /// Remove a set from an exercise
    RmSet { exercise: usize, set: usize },

    /// Add an exercise to the session
    AddEx { exercise: String },

    /// Remove an exercise from the session
    RmEx { exercise: usize },

    /// Move an exercise to another position
    Move { from: usize, to: usize },

    /// Start a rest timer
    Rest { seconds: u32 },

    /// Skip the current rest
    Skip,

    /// Add or remove rest time, e.g. `adjust -15`
    Adjust {
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },

    /// Pause the rest timer
    Pause,

    /// Resume the rest timer
    Resume,

    /// Show the rest timer
    Timer,

    /// Set one exercise's rest time
    Preset { exercise: usize, seconds: u32 },

    /// Set rest time for all exercises
    PresetAll {
        seconds: u32,

        /// Also override customized exercises
        #[arg(long)]
        template: bool,
    },

    /// Put an exercise back on the template rest time
    ResetPreset { exercise: usize },

    /// Suggest weight and reps from history
    Suggest { exercise: usize, set: usize },

    /// Finish and save the session
    Finish,

    /// Throw the session away
    Discard,

    /// Show recently finished workouts
    Recent,

    /// Leave the session prompt
    #[command(visible_aliases = ["q", "exit"])]
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definitions_are_consistent() {
        Cli::command().debug_assert();
        ShellLine::command().debug_assert();
    }

    #[test]
    fn shell_parses_negative_adjust() {
        let line = ShellLine::try_parse_from(["adjust", "-15"]).unwrap();
        assert!(matches!(line.cmd, ShellCmd::Adjust { delta: -15 }));
    }

    #[test]
    fn shell_parses_done_with_overrides() {
        let line = ShellLine::try_parse_from(["done", "2", "-w", "82.5", "-r", "8"]).unwrap();
        match line.cmd {
            ShellCmd::Done {
                exercise,
                set,
                weight,
                reps,
            } => {
                assert_eq!(exercise, 2);
                assert_eq!(set, None);
                assert_eq!(weight, Some(82.5));
                assert_eq!(reps, Some(8));
            }
            _ => panic!("expected done"),
        }
    }
}
