use assert_cmd::Command;
use blitz::libs::psl::Psl;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn command_align_psl() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("blitz")?;
    let output = cmd
        .arg("align")
        .arg("tests/blitz/targets.fa")
        .arg("tests/blitz/queries.fa")
        .arg("--mismatches")
        .arg("0")
        .arg("--parallel")
        .arg("1")
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let expected = "\
200\t0\t0\t0\t0\t0\t0\t0\t+\tq1\t200\t0\t200\tchr1\t1000\t100\t300\t1\t200,\t0,\t100,
200\t0\t0\t0\t0\t0\t0\t0\t-\tq2\t200\t0\t200\tchr2\t400\t50\t250\t1\t200,\t0,\t50,
200\t0\t0\t0\t1\t5\t0\t0\t+\tq4\t205\t0\t205\tchr1\t1000\t350\t550\t2\t100,100,\t0,105,\t350,450,
";
    assert_eq!(stdout, expected);

    Ok(())
}

#[test]
fn command_align_parallel() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let outfile = temp.path().join("out.psl");

    let mut cmd = Command::cargo_bin("blitz")?;
    cmd.arg("align")
        .arg("tests/blitz/targets.fa")
        .arg("tests/blitz/queries.fa")
        .arg("--mismatches")
        .arg("0")
        .arg("--parallel")
        .arg("4")
        .arg("-o")
        .arg(&outfile);
    cmd.assert().success();

    let content = fs::read_to_string(&outfile)?;
    let mut psls = content
        .lines()
        .map(|l| l.parse::<Psl>())
        .collect::<anyhow::Result<Vec<_>>>()?;
    psls.sort_by(|a, b| a.q_name.cmp(&b.q_name));

    let names: Vec<&str> = psls.iter().map(|p| p.q_name.as_str()).collect();
    assert_eq!(names, vec!["q1", "q2", "q4"]);

    for psl in &psls {
        let aligned: u32 = psl.block_sizes.iter().sum();
        assert_eq!(psl.match_count, aligned, "{}", psl.q_name);
        assert_eq!((psl.mismatch_count, psl.n_count), (0, 0));
    }
    assert_eq!((psls[1].t_name.as_str(), psls[1].strand.as_str()), ("chr2", "-"));
    assert_eq!(psls[2].block_count, 2);
    assert_eq!((psls[2].t_start, psls[2].t_end), (350, 550));

    Ok(())
}

#[test]
fn command_align_bed() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("blitz")?;
    cmd.arg("align")
        .arg("tests/blitz/targets.fa")
        .arg("tests/blitz/queries.fa")
        .arg("--mismatches")
        .arg("0")
        .arg("--format")
        .arg("bed")
        .arg("--strand")
        .arg("sense");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "chr1\t350\t550\tq4\t199\t+\t350\t550\t0\t2\t100,100,\t0,100,\n",
        ))
        .stdout(predicate::str::contains("chr1\t100\t300\tq1\t200\t+"))
        .stdout(predicate::str::contains("q2").not());

    Ok(())
}

#[test]
fn command_align_min_score() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("blitz")?;
    let output = cmd
        .arg("align")
        .arg("tests/blitz/targets.fa")
        .arg("tests/blitz/queries.fa")
        .arg("--min-score")
        .arg("1000")
        .output()?;
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    Ok(())
}

#[test]
fn command_align_missing_targets() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("blitz")?;
    cmd.arg("align")
        .arg("tests/blitz/not_there.fa")
        .arg("tests/blitz/queries.fa");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("could not open"));

    Ok(())
}

#[test]
fn command_align_gz_queries() -> anyhow::Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let temp = TempDir::new()?;
    let gz = temp.path().join("queries.fa.gz");
    let mut encoder = GzEncoder::new(fs::File::create(&gz)?, Compression::default());
    encoder.write_all(&fs::read("tests/blitz/queries.fa")?)?;
    encoder.finish()?;

    let mut cmd = Command::cargo_bin("blitz")?;
    let output = cmd
        .arg("align")
        .arg("tests/blitz/targets.fa")
        .arg(&gz)
        .arg("--mismatches")
        .arg("0")
        .arg("--parallel")
        .arg("1")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout.lines().count(), 3);
    assert!(stdout.contains("\tq1\t200\t0\t200\tchr1\t"));

    Ok(())
}
