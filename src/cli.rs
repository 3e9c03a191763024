use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Recipe parsing, import and nutrition estimates", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a pasted recipe into title, ingredients and instructions
    Parse {
        /// Path to the recipe text file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Fetch a recipe page and extract the recipe from it
    Import {
        #[arg(short, long)]
        url: String,
    },
    /// Estimate nutrition for a recipe text file
    Nutrition {
        /// Path to the recipe text file
        #[arg(short, long)]
        file: PathBuf,

        /// Divide totals across this many servings
        #[arg(short, long, default_value_t = 1)]
        servings: u32,

        /// Local CSV export of the reference sheet, checked before the food database
        #[arg(long)]
        sheet: Option<PathBuf>,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nutrition_args() {
        let cli = Cli::try_parse_from(["mealprep", "nutrition", "--file", "tacos.txt", "--servings", "4"]).unwrap();
        match cli.command {
            Commands::Nutrition { file, servings, sheet } => {
                assert_eq!(file, PathBuf::from("tacos.txt"));
                assert_eq!(servings, 4);
                assert!(sheet.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_import_requires_url() {
        assert!(Cli::try_parse_from(["mealprep", "import"]).is_err());
    }
}
