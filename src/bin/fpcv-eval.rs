#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
extern crate env_logger;
extern crate fp_data;
extern crate fpcv;
extern crate hashbrown;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;

use clap::{App, Arg, ArgMatches, SubCommand};
use hashbrown::HashMap;

use fp_data::arrays::{build_target_array, TargetSource};
use fp_data::folds::{kfold_masks, split_by_mask};

use fpcv::aggregate::delta_dict;
use fpcv::bin_utils::args::{ArgAugmenter, DataArgs, DataMeta, EvalArgs};
use fpcv::bin_utils::loaders::{
    evaluate_score_files, load_dataset, save_fingerprint_archive, write_fold, write_json,
};
use fpcv::config::EvalConfig;
use fpcv::cv::{summarize_folds, CvSummary, TargetSummary};
use fpcv::metrics::random_logauc;
use fpcv::Result;

/// Per-target difference between two runs
#[derive(Serialize, Debug)]
struct TargetDelta {
    auroc: f64,
    logauc: f64,
}

#[derive(Serialize, Debug)]
struct MetricsReport {
    adjusted: bool,
    summary: CvSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    baseline: Option<CvSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delta: Option<BTreeMap<String, TargetDelta>>,
}

/// Shifts every AUC and logAUC by the score of a random classifier
fn adjust(summary: &mut CvSummary) {
    let random = random_logauc(summary.min_fp);
    for t in summary.targets.values_mut() {
        t.auroc -= 0.5;
        t.logauc -= random;
    }
    summary.mean_auroc -= 0.5;
    summary.mean_logauc -= random;
}

fn run_arrays(dm: DataMeta, config: EvalConfig, out: &Path) -> Result<()> {
    let ds = load_dataset(&dm)?;
    save_fingerprint_archive(&ds, config.dense, out)?;
    Ok(())
}

fn run_folds(dm: DataMeta, config: EvalConfig, out_dir: &Path) -> Result<()> {
    let ds = load_dataset(&dm)?;
    let (target_arr, target_keys) =
        build_target_array(TargetSource::Parsed(&ds.targets), &ds.mol_list)?;
    let masks = kfold_masks(&target_arr, config.n_folds, config.seed)?;

    for (i, mask) in masks.iter().enumerate() {
        let split = split_by_mask(
            &ds.fingerprints,
            &ds.mol_list,
            &ds.targets,
            &target_keys,
            mask,
        )?;
        let paths = write_fold(out_dir, &dm.molecules, i, &split, &ds.mol_list)?;
        info!(
            "Fold {}: {} train and {} test molecules, written to {}",
            i,
            split.train_fps.len(),
            split.test_fps.len(),
            paths
                .first()
                .and_then(|p| p.parent())
                .map_or_else(|| out_dir.display().to_string(), |p| p.display().to_string())
        );
    }
    Ok(())
}

fn run_metrics(
    config: EvalConfig,
    scores: Vec<&str>,
    baseline: Option<Vec<&str>>,
    output: Option<&str>,
) -> Result<()> {
    let folds = evaluate_score_files(scores)?;
    let mut summary = summarize_folds(&folds, config.min_fp)?;

    let mut baseline = match baseline {
        Some(paths) => Some(summarize_folds(&evaluate_score_files(paths)?, config.min_fp)?),
        None => None,
    };

    // Differences are the same adjusted or not
    let delta = baseline.as_ref().map(|b| {
        let metric = |s: &CvSummary, f: fn(&TargetSummary) -> f64| -> HashMap<String, f64> {
            s.targets.iter().map(|(k, t)| (k.clone(), f(t))).collect()
        };
        let auroc = delta_dict(&metric(&summary, |t| t.auroc), &metric(b, |t| t.auroc));
        let logauc = delta_dict(&metric(&summary, |t| t.logauc), &metric(b, |t| t.logauc));
        auroc
            .into_iter()
            .filter_map(|(k, a)| {
                let l = *logauc.get(&k)?;
                Some((k, TargetDelta { auroc: a, logauc: l }))
            })
            .collect::<BTreeMap<_, _>>()
    });

    if config.adjusted {
        adjust(&mut summary);
        if let Some(b) = baseline.as_mut() {
            adjust(b);
        }
    }
    info!(
        "Mean AUROC: {:.4}, mean AUPRC: {:.4}, mean logAUC: {:.4}",
        summary.mean_auroc, summary.mean_auprc, summary.mean_logauc
    );

    let report = MetricsReport {
        adjusted: config.adjusted,
        summary,
        baseline,
        delta,
    };
    write_json(&report, output)
}

fn parse<'a>() -> ArgMatches<'a> {
    let arrays = SubCommand::with_name("arrays")
        .about("Builds the fingerprint array of a dataset and saves it")
        .arg(
            Arg::with_name("out")
                .short("o")
                .long("out")
                .takes_value(true)
                .required(true)
                .help("Path to write the fingerprint archive to"),
        );
    let arrays = EvalArgs.add_args(DataArgs.add_args(arrays));

    let folds = SubCommand::with_name("folds")
        .about("Splits a dataset into cross-validation folds")
        .arg(
            Arg::with_name("out_dir")
                .short("o")
                .long("out-dir")
                .takes_value(true)
                .required(true)
                .help("Directory to write one subdirectory per fold to"),
        );
    let folds = EvalArgs.add_args(DataArgs.add_args(folds));

    let metrics = SubCommand::with_name("metrics")
        .about("Computes per-target metrics from scored folds")
        .arg(
            Arg::with_name("scores")
                .long("scores")
                .takes_value(true)
                .multiple(true)
                .required(true)
                .help("Scores files, one per fold: target, label and score per line"),
        )
        .arg(
            Arg::with_name("baseline")
                .long("baseline")
                .takes_value(true)
                .multiple(true)
                .help("Scores files of a run to compare against"),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .takes_value(true)
                .help("Writes results to a file instead of stdout"),
        );
    let metrics = EvalArgs.add_args(metrics);

    App::new("fpcv-eval")
        .version(crate_version!())
        .about("Cross-validated evaluation of molecular fingerprints")
        .subcommand(arrays)
        .subcommand(folds)
        .subcommand(metrics)
        .get_matches()
}

fn run(args: ArgMatches) -> Result<()> {
    match args.subcommand() {
        ("arrays", Some(sub)) => {
            let config = EvalArgs.load_from_args(sub)?;
            let out = PathBuf::from(sub.value_of_os("out").unwrap_or_default());
            run_arrays(DataArgs.load_from_args(sub), config, &out)
        }
        ("folds", Some(sub)) => {
            let config = EvalArgs.load_from_args(sub)?;
            let out_dir = PathBuf::from(sub.value_of_os("out_dir").unwrap_or_default());
            run_folds(DataArgs.load_from_args(sub), config, &out_dir)
        }
        ("metrics", Some(sub)) => {
            let config = EvalArgs.load_from_args(sub)?;
            let scores = sub.values_of("scores").map(|v| v.collect()).unwrap_or_default();
            let baseline = sub.values_of("baseline").map(|v| v.collect());
            run_metrics(config, scores, baseline, sub.value_of("output"))
        }
        _ => {
            eprintln!("{}", args.usage());
            process::exit(2)
        }
    }
}

fn main() {
    env_logger::init();
    let args = parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        process::exit(1);
    }
}
