//! Line and byte oriented file algorithms behind `more`, `sort`, `uniq` and `cmp`.
//!
//! Every function works on generic readers and writers. Lines keep their
//! terminator, so comparisons and output are byte-exact.

use std::io::{self, BufRead, Read, Write};

/// Printed by [`page`] after each full page.
pub const MORE_PROMPT: &str = "--More--";

/// Read one line (terminator included) into `buf`. Returns `false` at end of input.
fn next_line(reader: &mut impl BufRead, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    Ok(reader.read_until(b'\n', buf)? > 0)
}

/// How a paging session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The source ran out of lines.
    Finished,
    /// The reader answered a prompt with `q`.
    Quit,
}

/// Copy `source` to `out`, pausing every `page_lines` lines.
///
/// At each pause [`MORE_PROMPT`] is written and flushed, then `control` is read up
/// to the next newline. A `q` anywhere before that newline ends the session.
/// Any other answer, an empty line or end of the control stream resumes output.
pub fn page(
    mut source: impl BufRead,
    control: &mut dyn Read,
    out: &mut dyn Write,
    page_lines: usize,
) -> io::Result<PageOutcome> {
    let mut line = Vec::new();
    let mut printed = 0usize;
    while next_line(&mut source, &mut line)? {
        out.write_all(&line)?;
        printed += 1;
        if page_lines == 0 || printed % page_lines != 0 {
            continue;
        }
        out.write_all(MORE_PROMPT.as_bytes())?;
        out.flush()?;
        if wants_quit(control)? {
            out.write_all(b"\n")?;
            return Ok(PageOutcome::Quit);
        }
    }
    Ok(PageOutcome::Finished)
}

/// Consume one answer line from `control`; `true` if it contained `q` before the newline.
fn wants_quit(control: &mut dyn Read) -> io::Result<bool> {
    let mut byte = [0u8; 1];
    loop {
        match control.read(&mut byte) {
            Ok(0) => return Ok(false),
            Ok(_) if byte[0] == b'q' => return Ok(true),
            Ok(_) if byte[0] == b'\n' => return Ok(false),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

/// Write all lines of `source` to `out` in byte-lexicographic order.
pub fn sort_lines(mut source: impl BufRead, out: &mut dyn Write) -> io::Result<()> {
    let mut lines = Vec::new();
    let mut line = Vec::new();
    while next_line(&mut source, &mut line)? {
        lines.push(std::mem::take(&mut line));
    }
    lines.sort_unstable();
    for line in &lines {
        out.write_all(line)?;
    }
    Ok(())
}

/// Write each line of `source` unless it equals the previously written line.
pub fn uniq_lines(mut source: impl BufRead, out: &mut dyn Write) -> io::Result<()> {
    let mut prev: Option<Vec<u8>> = None;
    let mut line = Vec::new();
    while next_line(&mut source, &mut line)? {
        if prev.as_deref() == Some(line.as_slice()) {
            continue;
        }
        out.write_all(&line)?;
        prev = Some(line.clone());
    }
    Ok(())
}

/// Result of a byte-wise comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Identical,
    /// First differing position, 1-based. When one input is a prefix of the
    /// other this is one past the end of the shorter input.
    Differ { byte: u64 },
}

/// Compare two streams byte by byte in lockstep.
pub fn compare(a: impl Read, b: impl Read) -> io::Result<Comparison> {
    let mut a = io::BufReader::new(a).bytes();
    let mut b = io::BufReader::new(b).bytes();
    let mut pos: u64 = 0;
    loop {
        pos += 1;
        match (a.next().transpose()?, b.next().transpose()?) {
            (None, None) => return Ok(Comparison::Identical),
            (Some(x), Some(y)) if x == y => {}
            _ => return Ok(Comparison::Differ { byte: pos }),
        }
    }
}
