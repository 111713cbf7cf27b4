use crate::libs::nt;
use crate::libs::sfx::SuffixIndex;
use anyhow::Context;
use std::io::{BufRead, BufReader, BufWriter, Write};

/// ```
/// use std::io::BufRead;
/// let reader = blitz::reader("tests/blitz/queries.fa").unwrap();
/// let headers = reader
///     .lines()
///     .map_while(Result::ok)
///     .filter(|l| l.starts_with('>'))
///     .count();
/// assert_eq!(headers, 4);
///
/// assert!(blitz::reader("tests/blitz/missing.fa").is_err());
/// ```
pub fn reader(input: &str) -> anyhow::Result<Box<dyn BufRead + Send>> {
    let reader: Box<dyn BufRead + Send> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = std::path::Path::new(input);
        let file = std::fs::File::open(path)
            .with_context(|| format!("could not open {}", path.display()))?;

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

pub fn writer(output: &str) -> anyhow::Result<Box<dyn Write + Send>> {
    let writer: Box<dyn Write + Send> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        let file = std::fs::File::create(output)
            .with_context(|| format!("could not create {}", output))?;
        Box::new(BufWriter::new(file))
    };

    Ok(writer)
}

/// Calls `f` with the name and raw bases of every record in a FASTA file.
/// Stops early when `f` returns `false`.
pub fn for_each_fasta<F>(input: &str, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(String, &[u8]) -> anyhow::Result<bool>,
{
    let mut fa_in = noodles_fasta::io::Reader::new(reader(input)?);

    for result in fa_in.records() {
        let record = result.with_context(|| format!("malformed FASTA in {}", input))?;
        let name = String::from_utf8(record.name().into())?;
        if !f(name, record.sequence().as_ref())? {
            break;
        }
    }

    Ok(())
}

/// Indexes every sequence of a FASTA file under its name.
///
/// Lowercase bases keep their repeat mask. Empty records are skipped with a warning.
pub fn load_targets(input: &str) -> anyhow::Result<SuffixIndex<String>> {
    let mut index = SuffixIndex::new();

    for_each_fasta(input, |name, seq| {
        if seq.is_empty() {
            log::warn!("Skipping empty target {}", name);
            return Ok(true);
        }
        index
            .add(name.clone(), &nt::encode(seq))
            .with_context(|| format!("could not index target {}", name))?;
        Ok(true)
    })?;

    if index.num_seqs() == 0 {
        anyhow::bail!("no target sequences in {}", input);
    }
    log::info!(
        "Loaded {} targets, {} bases",
        index.num_seqs(),
        index.corpus().entries().iter().map(|e| e.len).sum::<usize>()
    );

    index.build().context("could not build the suffix index")?;
    Ok(index)
}
