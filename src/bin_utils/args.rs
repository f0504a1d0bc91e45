use std::path::{Path, PathBuf};

use clap::{App, Arg, ArgMatches};

use crate::config::{load_config, EvalConfig};
use crate::error::{CvError, Result};

/// Trait to add new arguments to the current app
pub trait ArgAugmenter {
    /// Type of struct to output from this parser
    type Output;

    /// Specifies arguments to add
    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b>;

    /// Parses the arguments
    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> Self::Output;
}

/// Specifies the input files of a dataset
#[derive(Debug, Clone)]
pub struct DataMeta {
    /// Molecules file
    pub molecules: PathBuf,
    /// Targets file
    pub targets: PathBuf,
    /// If provided, drops targets with fewer binders
    pub min_mols: Option<usize>,
}

/// Struct defining the dataset arguments using ArgAugmenter
pub struct DataArgs;

impl ArgAugmenter for DataArgs {
    type Output = DataMeta;

    /// Specifies arguments to add for the dataset
    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b> {
        app.arg(
            Arg::with_name("molecules")
                .index(1)
                .required(true)
                .help("Molecules file: mol_id, bit width and set bits per line"),
        )
        .arg(
            Arg::with_name("targets")
                .index(2)
                .required(true)
                .help("Targets file: key, name, description and binders per line"),
        )
        .arg(
            Arg::with_name("min_mols")
                .long("min-mols")
                .takes_value(true)
                .help("Drops targets with fewer binders than this"),
        )
    }

    /// Parses the arguments for the dataset
    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> Self::Output {
        // Both are required, so clap has already checked they are there
        let molecules = args.value_of_os("molecules").unwrap_or_default().into();
        let targets = args.value_of_os("targets").unwrap_or_default().into();
        DataMeta {
            molecules,
            targets,
            min_mols: value_t!(args, "min_mols", usize).ok(),
        }
    }
}

/// Struct defining the evaluation settings using ArgAugmenter. Values given on
/// the command line override those of the config file.
pub struct EvalArgs;

impl ArgAugmenter for EvalArgs {
    type Output = Result<EvalConfig>;

    /// Specifies arguments to add for evaluation
    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b> {
        app.arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .takes_value(true)
                .help("Path to an evaluation config json"),
        )
        .arg(
            Arg::with_name("min_fp")
                .long("min-fp")
                .takes_value(true)
                .help("False positive rate cutoff for logAUC. Defaults to 0.001"),
        )
        .arg(
            Arg::with_name("adjusted")
                .long("adjusted")
                .help("If provided, reports AUC and logAUC above a random classifier"),
        )
        .arg(
            Arg::with_name("folds")
                .short("k")
                .long("folds")
                .takes_value(true)
                .help("Number of cross-validation folds"),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .takes_value(true)
                .help("Random seed for reproducability"),
        )
        .arg(
            Arg::with_name("dense")
                .long("dense")
                .help("If provided, builds dense fingerprint arrays"),
        )
    }

    /// Parses the arguments for evaluation
    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> Self::Output {
        let mut config = match args.value_of("config") {
            Some(path) => load_config(Path::new(path))?,
            None => EvalConfig::default(),
        };
        if args.is_present("min_fp") {
            config.min_fp = value_t!(args, "min_fp", f64).map_err(bad_value)?;
        }
        if args.is_present("folds") {
            config.n_folds = value_t!(args, "folds", usize).map_err(bad_value)?;
        }
        if args.is_present("seed") {
            config.seed = value_t!(args, "seed", u64).map_err(bad_value)?;
        }
        config.adjusted |= args.is_present("adjusted");
        config.dense |= args.is_present("dense");
        config.validate()
    }
}

fn bad_value(e: clap::Error) -> CvError {
    CvError::Config(e.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app<'a, 'b>() -> App<'a, 'b> {
        EvalArgs.add_args(DataArgs.add_args(App::new("test")))
    }

    #[test]
    fn test_data_args() {
        let args = app().get_matches_from(vec!["test", "mols.tsv", "targets.tsv", "--min-mols", "3"]);
        let dm = DataArgs.load_from_args(&args);
        assert_eq!(dm.molecules, PathBuf::from("mols.tsv"));
        assert_eq!(dm.targets, PathBuf::from("targets.tsv"));
        assert_eq!(dm.min_mols, Some(3));
    }

    #[test]
    fn test_eval_args_override_defaults() {
        let args = app().get_matches_from(vec![
            "test", "m", "t", "--min-fp", "0.01", "--adjusted", "-k", "3",
        ]);
        let config = EvalArgs.load_from_args(&args).unwrap();
        assert_eq!(config.min_fp, 0.01);
        assert!(config.adjusted);
        assert_eq!(config.n_folds, 3);
        assert_eq!(config.seed, EvalConfig::default().seed);
        assert!(!config.dense);
    }

    #[test]
    fn test_eval_args_invalid() {
        let args = app().get_matches_from(vec!["test", "m", "t", "--min-fp", "abc"]);
        assert!(EvalArgs.load_from_args(&args).is_err());
        let args = app().get_matches_from(vec!["test", "m", "t", "--min-fp", "2"]);
        assert!(EvalArgs.load_from_args(&args).is_err());
    }
}
