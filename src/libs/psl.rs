use crate::libs::chaining::AlignPath;
use crate::libs::nt::Strand;
use std::fmt;
use std::io;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Psl {
    pub match_count: u32,
    pub mismatch_count: u32,
    pub rep_match: u32,
    pub n_count: u32,
    pub q_num_insert: u32,
    pub q_base_insert: i32,
    pub t_num_insert: u32,
    pub t_base_insert: i32,
    pub strand: String, // "+", "-"
    pub q_name: String,
    pub q_size: u32,
    pub q_start: i32,
    pub q_end: i32,
    pub t_name: String,
    pub t_size: u32,
    pub t_start: i32,
    pub t_end: i32,
    pub block_count: u32,
    pub block_sizes: Vec<u32>,
    pub q_starts: Vec<u32>,
    pub t_starts: Vec<u32>,
}

impl Psl {
    /// Converts an alignment path.
    ///
    /// Block query starts of antisense paths stay on the reverse-complemented query,
    /// while `q_start`/`q_end` are given on the forward query.
    pub fn from_path(
        path: &AlignPath,
        q_name: &str,
        q_size: usize,
        t_name: &str,
        t_size: usize,
    ) -> Self {
        let (q_start, q_end) = match path.strand {
            Strand::Sense => (path.q_start(), path.q_end()),
            Strand::Antisense => (
                q_size.saturating_sub(path.q_end()),
                q_size.saturating_sub(path.q_start()),
            ),
        };

        Psl {
            match_count: path.matches() as u32,
            mismatch_count: path.mismatches() as u32,
            rep_match: 0,
            n_count: path.n_count() as u32,
            q_num_insert: path.q_num_insert as u32,
            q_base_insert: path.q_base_insert as i32,
            t_num_insert: path.t_num_insert as u32,
            t_base_insert: path.t_base_insert as i32,
            strand: path.strand.as_char().to_string(),
            q_name: q_name.to_string(),
            q_size: q_size as u32,
            q_start: q_start as i32,
            q_end: q_end as i32,
            t_name: t_name.to_string(),
            t_size: t_size as u32,
            t_start: path.t_start() as i32,
            t_end: path.t_end() as i32,
            block_count: path.blocks.len() as u32,
            block_sizes: path.blocks.iter().map(|b| b.len as u32).collect(),
            q_starts: path.blocks.iter().map(|b| b.q_start as u32).collect(),
            t_starts: path.blocks.iter().map(|b| b.t_start as u32).collect(),
        }
    }

    pub fn score(&self) -> i32 {
        (self.match_count + (self.rep_match >> 1)) as i32
            - self.mismatch_count as i32
            - self.q_num_insert as i32
            - self.t_num_insert as i32
    }
}

impl std::str::FromStr for Psl {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('\t').collect();
        if fields.len() < 21 {
            return Err(anyhow::anyhow!("Invalid PSL line: fewer than 21 columns"));
        }

        let parse_u32 = |s: &str| {
            s.parse::<u32>()
                .map_err(|_| anyhow::anyhow!("Invalid u32: {}", s))
        };
        let parse_i32 = |s: &str| {
            s.parse::<i32>()
                .map_err(|_| anyhow::anyhow!("Invalid i32: {}", s))
        };
        let parse_vec = |s: &str| -> Result<Vec<u32>, anyhow::Error> {
            s.split(',')
                .filter(|v| !v.is_empty())
                .map(|v| {
                    v.parse::<u32>()
                        .map_err(|_| anyhow::anyhow!("Invalid array val: {}", v))
                })
                .collect()
        };

        let psl = Psl {
            match_count: parse_u32(fields[0])?,
            mismatch_count: parse_u32(fields[1])?,
            rep_match: parse_u32(fields[2])?,
            n_count: parse_u32(fields[3])?,
            q_num_insert: parse_u32(fields[4])?,
            q_base_insert: parse_i32(fields[5])?,
            t_num_insert: parse_u32(fields[6])?,
            t_base_insert: parse_i32(fields[7])?,
            strand: fields[8].to_string(),
            q_name: fields[9].to_string(),
            q_size: parse_u32(fields[10])?,
            q_start: parse_i32(fields[11])?,
            q_end: parse_i32(fields[12])?,
            t_name: fields[13].to_string(),
            t_size: parse_u32(fields[14])?,
            t_start: parse_i32(fields[15])?,
            t_end: parse_i32(fields[16])?,
            block_count: parse_u32(fields[17])?,
            block_sizes: parse_vec(fields[18])?,
            q_starts: parse_vec(fields[19])?,
            t_starts: parse_vec(fields[20])?,
        };

        let n = psl.block_count as usize;
        if psl.block_sizes.len() != n || psl.q_starts.len() != n || psl.t_starts.len() != n {
            return Err(anyhow::anyhow!(
                "Invalid PSL line: block count {} does not match block lists",
                n
            ));
        }

        Ok(psl)
    }
}

impl Psl {
    pub fn write_to<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        write!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t",
            self.match_count,
            self.mismatch_count,
            self.rep_match,
            self.n_count,
            self.q_num_insert,
            self.q_base_insert,
            self.t_num_insert,
            self.t_base_insert,
            self.strand,
            self.q_name,
            self.q_size,
            self.q_start,
            self.q_end,
            self.t_name,
            self.t_size,
            self.t_start,
            self.t_end,
            self.block_count
        )?;

        for s in &self.block_sizes {
            write!(w, "{},", s)?;
        }
        write!(w, "\t")?;
        for s in &self.q_starts {
            write!(w, "{},", s)?;
        }
        write!(w, "\t")?;
        for s in &self.t_starts {
            write!(w, "{},", s)?;
        }

        writeln!(w)?;
        Ok(())
    }

    /// Writes the alignment as a BED12 line on the target.
    ///
    /// The BED score is the PSL score clamped to 0..=1000.
    pub fn write_bed_to<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        write!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t0\t{}\t",
            self.t_name,
            self.t_start,
            self.t_end,
            self.q_name,
            self.score().clamp(0, 1000),
            self.strand,
            self.t_start,
            self.t_end,
            self.block_count
        )?;

        for s in &self.block_sizes {
            write!(w, "{},", s)?;
        }
        write!(w, "\t")?;
        for s in &self.t_starts {
            write!(w, "{},", *s as i32 - self.t_start)?;
        }

        writeln!(w)?;
        Ok(())
    }
}

impl fmt::Display for Psl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.write_to(&mut buf).map_err(|_| fmt::Error)?;
        let s = String::from_utf8_lossy(&buf);
        write!(f, "{}", s.trim_end())
    }
}
