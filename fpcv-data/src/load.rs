//! Load
//! ---
//!
//! This defines the methods to read targets, fingerprints and scores from
//! tab separated text files, optionally gzipped, and to write targets and
//! fingerprints back out in the same format
use flate2;
use rayon;

use self::flate2::read::MultiGzDecoder;
use self::flate2::write::GzEncoder;
use self::flate2::Compression;
use self::rayon::prelude::*;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::dataset::types::{
    FingerprintLine, LineParse, MolFingerprints, MolList, ScoreLine, TargetLine, TargetMap,
};
use crate::error::{DataError, Result};

/// Target key -> (labels, scores) in file order
pub type ScoreTable = BTreeMap<String, (Vec<u8>, Vec<f64>)>;

fn is_gzipped(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "gz")
}

/// Opens a file for buffered reading, decompressing `.gz` files on the fly
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let f = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(f))))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

/// Given one numbered line, parses it. Blank lines and lines starting with `#`
/// give None; a `#` anywhere else is part of a field.
pub fn parse_line<F: LineParse>(fmt: &F, line_no: usize, line: &str) -> Result<Option<F::Out>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    fmt.parse(line.split('\t'))
        .map(Some)
        .map_err(|msg| DataError::Parse { line: line_no, msg })
}

/// Hard code buffersize for now
static BUFFER_SIZE: usize = 1000;

/// Reads every record of a file. Lines are read in chunks and each chunk is
/// parsed in parallel; output keeps file order.
pub fn read_records<F: LineParse>(fmt: &F, path: &Path) -> Result<Vec<F::Out>> {
    let mut it = open_reader(path)?.lines().enumerate();
    let mut records = Vec::new();
    let mut buffer: Vec<(usize, String)> = Vec::with_capacity(BUFFER_SIZE);
    let mut tmp_results = Vec::with_capacity(BUFFER_SIZE);
    loop {
        buffer.clear();
        for _ in 0..BUFFER_SIZE {
            match it.next() {
                Some((i, line)) => buffer.push((i + 1, line?)),
                None => break,
            }
        }
        if buffer.is_empty() {
            break;
        }

        tmp_results.clear();
        // Parse in parallel
        buffer
            .par_iter()
            .map(|(n, l)| parse_line(fmt, *n, l))
            .collect_into_vec(&mut tmp_results);

        for res in tmp_results.drain(..) {
            if let Some(rec) = res? {
                records.push(rec);
            }
        }
    }
    records.shrink_to_fit();
    Ok(records)
}

/// Reads a targets file into a map keyed by target key
pub fn read_targets(path: &Path) -> Result<TargetMap> {
    let records = read_records(&TargetLine, path)?;
    let mut targets = TargetMap::with_capacity(records.len());
    for (key, target) in records {
        if targets.contains_key(&key) {
            return Err(DataError::InvalidInput(format!(
                "duplicate target key `{}` in {}",
                key,
                path.display()
            )));
        }
        targets.insert(key, target);
    }
    info!("Loaded {} targets from {}", targets.len(), path.display());
    Ok(targets)
}

/// Reads a molecules file. The molecule list follows first appearance in the file
/// and each molecule keeps its fingerprint records in file order.
pub fn read_molecules(path: &Path) -> Result<(MolList, MolFingerprints)> {
    let records = read_records(&FingerprintLine, path)?;
    let mut mol_list = MolList::new();
    let mut fingerprints = MolFingerprints::new();
    let num_records = records.len();
    for (mol, record) in records {
        let recs = fingerprints.entry(mol.clone()).or_insert_with(|| {
            mol_list.push(mol);
            Vec::new()
        });
        recs.push(record);
    }
    info!(
        "Loaded {} fingerprints for {} molecules from {}",
        num_records,
        mol_list.len(),
        path.display()
    );
    Ok((mol_list, fingerprints))
}

/// Reads a scores file, grouping labels and scores by target
pub fn read_scores(path: &Path) -> Result<ScoreTable> {
    let mut table = ScoreTable::new();
    for (key, label, score) in read_records(&ScoreLine, path)? {
        let entry = table.entry(key).or_insert_with(|| (Vec::new(), Vec::new()));
        entry.0.push(label);
        entry.1.push(score);
    }
    debug!("Read scores for {} targets from {}", table.len(), path.display());
    Ok(table)
}

/// Writes one line per item, compressing if the path ends in `.gz`
fn write_lines<I: IntoIterator<Item = String>>(path: &Path, lines: I) -> Result<usize> {
    let f = BufWriter::new(File::create(path)?);
    let mut n = 0;
    if is_gzipped(path) {
        let mut enc = GzEncoder::new(f, Compression::default());
        for line in lines {
            writeln!(enc, "{}", line)?;
            n += 1;
        }
        enc.finish()?.flush()?;
    } else {
        let mut f = f;
        for line in lines {
            writeln!(f, "{}", line)?;
            n += 1;
        }
        f.flush()?;
    }
    Ok(n)
}

/// Fails if `value` could not be read back as the field it is written to.
/// Tabs and line breaks end fields, a leading `#` turns the line into a
/// comment, and list items can't hold commas.
fn check_field(what: &str, value: &str, first: bool, list_item: bool) -> Result<()> {
    let bad = value.contains(|c: char| c == '\t' || c == '\n' || c == '\r')
        || (first && (value.trim().is_empty() || value.trim_start().starts_with('#')))
        || (list_item && value.contains(','));
    if bad {
        return Err(DataError::InvalidInput(format!(
            "{} `{}` can't be written as a field",
            what,
            value.escape_debug()
        )));
    }
    Ok(())
}

/// Writes targets sorted by key, in the format `read_targets` reads
pub fn write_targets(path: &Path, targets: &TargetMap) -> Result<()> {
    let mut keys: Vec<&String> = targets.keys().collect();
    keys.sort();
    for &k in keys.iter() {
        let t = &targets[k];
        check_field("target key", k, true, false)?;
        check_field("target name", &t.name, false, false)?;
        check_field("target description", &t.description, false, false)?;
        for cid in t.cids.iter() {
            check_field("molecule id", cid, true, true)?;
        }
    }
    let n = write_lines(
        path,
        keys.into_iter().map(|k| {
            let t = &targets[k];
            format!("{}\t{}\t{}\t{}", k, t.name, t.description, t.cids.join(","))
        }),
    )?;
    debug!("Wrote {} targets to {}", n, path.display());
    Ok(())
}

/// Writes the fingerprint records of the listed molecules, in list order.
/// Listed molecules without fingerprints are skipped.
pub fn write_molecules(path: &Path, mol_list: &[String], fps: &MolFingerprints) -> Result<()> {
    for m in mol_list.iter().filter(|m| fps.contains_key(*m)) {
        check_field("molecule id", m, true, true)?;
    }
    let lines = mol_list
        .iter()
        .filter_map(|m| fps.get(m).map(|recs| (m, recs)))
        .flat_map(|(m, recs)| {
            recs.iter().map(move |r| {
                let bits: Vec<String> = r.on_bits.iter().map(|b| b.to_string()).collect();
                format!("{}\t{}\t{}", m, r.bits, bits.join(","))
            })
        });
    let n = write_lines(path, lines)?;
    debug!("Wrote {} fingerprints to {}", n, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::types::{FingerprintRecord, Target};
    use tempfile::tempdir;

    fn write_text(path: &Path, lines: &[&str]) {
        let mut file = File::create(path).expect("Must be able to write to file in test");
        for line in lines {
            writeln!(file, "{}", line).expect("Must be able to write to file in test");
        }
    }

    #[test]
    fn test_read_molecules() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("mols.tsv");
        write_text(
            &path,
            &[
                "# mol_id\tbits\tindices",
                "m2\t16\t1,4",
                "m1\t16\t0",
                "",
                "  # second conformer",
                "m2\t16\t3",
            ],
        );
        let (mol_list, fps) = read_molecules(&path).expect("should parse");
        assert_eq!(mol_list, vec!["m2", "m1"]);
        assert_eq!(fps["m2"].len(), 2);
        assert_eq!(fps["m2"][1].on_bits, vec![3]);
        assert_eq!(fps["m1"][0].bits, 16);
    }

    #[test]
    fn test_read_targets_gz() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("targets.tsv.gz");
        {
            let f = File::create(&path).unwrap();
            let mut enc = GzEncoder::new(f, Compression::default());
            writeln!(enc, "T2\tsecond\tdesc two\tm1").unwrap();
            writeln!(enc, "T1\tfirst\tdesc one\tm2,m1").unwrap();
            enc.finish().unwrap();
        }
        let targets = read_targets(&path).expect("should parse");
        assert_eq!(targets.len(), 2);
        assert_eq!(targets["T1"].cids, vec!["m1", "m2"]);
        assert_eq!(targets["T2"].name, "second");
    }

    #[test]
    fn test_parse_error_has_line() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("mols.tsv");
        write_text(&path, &["m1\t8\t1", "m2\teight\t1"]);
        match read_molecules(&path) {
            Err(DataError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {:?}", other.map(|x| x.0)),
        }
    }

    #[test]
    fn test_duplicate_target() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("targets.tsv");
        write_text(&path, &["T1\ta\tb\tm1", "T1\ta\tb\tm2"]);
        assert!(read_targets(&path).is_err());
    }

    #[test]
    fn test_read_scores() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scores.tsv");
        write_text(&path, &["T1\t1\t0.9", "T2\t0\t0.1", "T1\t0\t0.2"]);
        let table = read_scores(&path).unwrap();
        assert_eq!(table["T1"], (vec![1, 0], vec![0.9, 0.2]));
        assert_eq!(table["T2"], (vec![0], vec![0.1]));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempdir().expect("tempdir");
        let mut targets = TargetMap::new();
        targets.insert(
            "T1".into(),
            Target::new("one", vec!["m1".into(), "m2".into()], "first"),
        );
        targets.insert("T2".into(), Target::new("two", vec![], ""));
        let mut fps = MolFingerprints::new();
        fps.insert("m2".into(), vec![FingerprintRecord::new(32, vec![4, 1])]);
        fps.insert(
            "m1".into(),
            vec![
                FingerprintRecord::new(32, vec![0]),
                FingerprintRecord::new(32, vec![]),
            ],
        );
        let mol_list = vec!["m2".to_string(), "m9".to_string(), "m1".to_string()];

        for ext in &["tsv", "tsv.gz"] {
            let tpath = dir.path().join(format!("targets.{}", ext));
            let mpath = dir.path().join(format!("mols.{}", ext));
            write_targets(&tpath, &targets).expect("write targets");
            write_molecules(&mpath, &mol_list, &fps).expect("write molecules");

            assert_eq!(read_targets(&tpath).unwrap(), targets);
            let (read_list, read_fps) = read_molecules(&mpath).unwrap();
            assert_eq!(read_list, vec!["m2", "m1"]);
            assert_eq!(read_fps, fps);
        }
    }

    #[test]
    fn test_hash_inside_fields() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("targets.tsv.gz");
        let mut targets = TargetMap::new();
        targets.insert(
            "T1".into(),
            Target::new("5-HT receptor #2", vec!["m#1".into()], "GPCR # class A"),
        );
        write_targets(&path, &targets).expect("write targets");
        assert_eq!(read_targets(&path).unwrap(), targets);
    }

    #[test]
    fn test_unwritable_fields() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("out.tsv");
        let bad_targets = vec![
            ("T1", Target::new("tab\tname", vec![], "")),
            ("T1", Target::new("name", vec![], "two\nlines")),
            ("#T1", Target::new("name", vec![], "")),
            ("T1", Target::new("name", vec!["m1,m2".into()], "")),
        ];
        for (key, target) in bad_targets {
            let mut targets = TargetMap::new();
            targets.insert(key.into(), target);
            match write_targets(&path, &targets) {
                Err(DataError::InvalidInput(_)) => (),
                other => panic!("unexpected: {:?}", other),
            }
        }

        let mut fps = MolFingerprints::new();
        fps.insert("m,1".into(), vec![FingerprintRecord::new(8, vec![1])]);
        assert!(write_molecules(&path, &["m,1".to_string()], &fps).is_err());
    }

    #[test]
    fn test_missing_file() {
        match read_targets(Path::new("/nonexistent/targets.tsv")) {
            Err(DataError::Io(_)) => (),
            other => panic!("unexpected: {:?}", other.map(|t| t.len())),
        }
    }
}
