//! Match replay recording
//!
//! The match loop reports to a [`Recorder`] at four points: names before
//! play, a snapshot after every round, the verdict, and teardown. Recording
//! is best-effort; the caller logs failures and carries on.

use shared::{Board, Role};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub trait Recorder: Send {
    fn set_names(&mut self, hot: &str, cool: &str) -> io::Result<()>;

    /// Called once per recorded round with the post-round board
    fn action(&mut self, board: &Board) -> io::Result<()>;

    /// `winner` is `None` on a draw
    fn result(
        &mut self,
        winner: Option<&str>,
        loser: Option<&str>,
        reason: &str,
    ) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()>;
}

/// Discards everything; used when dumping is disabled
#[derive(Debug, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn set_names(&mut self, _hot: &str, _cool: &str) -> io::Result<()> {
        Ok(())
    }

    fn action(&mut self, _board: &Board) -> io::Result<()> {
        Ok(())
    }

    fn result(
        &mut self,
        _winner: Option<&str>,
        _loser: Option<&str>,
        _reason: &str,
    ) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes the text replay format read by match viewers
pub struct DumpRecorder<W: Write> {
    writer: Option<BufWriter<W>>,
    map_lines: Vec<String>,
}

impl DumpRecorder<File> {
    pub fn create(path: impl AsRef<Path>, map_source: &str) -> io::Result<Self> {
        Ok(Self::new(File::create(path)?, map_source))
    }
}

impl<W: Write> DumpRecorder<W> {
    /// `map_source` is the map text the board was loaded from
    pub fn new(inner: W, map_source: &str) -> Self {
        let map_lines = map_source
            .lines()
            .filter_map(|line| line.get(2..))
            .map(str::to_string)
            .collect();

        Self {
            writer: Some(BufWriter::new(inner)),
            map_lines,
        }
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<W>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "dump already closed"))
    }

    /// Flushes and hands back the underlying writer
    pub fn into_inner(mut self) -> io::Result<Option<W>> {
        match self.writer.take() {
            Some(writer) => writer.into_inner().map(Some).map_err(|e| e.into_error()),
            None => Ok(None),
        }
    }
}

impl<W: Write + Send> Recorder for DumpRecorder<W> {
    fn set_names(&mut self, hot: &str, cool: &str) -> io::Result<()> {
        let map_lines = std::mem::take(&mut self.map_lines);
        let writer = self.writer()?;

        writeln!(writer, "{},{}", hot, cool)?;
        for line in &map_lines {
            writeln!(writer, "{}", line)?;
        }
        writeln!(writer, "0,0")?;
        writer.flush()
    }

    fn action(&mut self, board: &Board) -> io::Result<()> {
        let writer = self.writer()?;

        for row in board.rows() {
            let digits: Vec<String> = row.iter().map(|c| c.map_value().to_string()).collect();
            writeln!(writer, "{}", digits.join(","))?;
        }

        let (hot, cool) = (board.character(Role::Hot), board.character(Role::Cool));
        writeln!(writer, "{},{}", hot.position.row, hot.position.col)?;
        writeln!(writer, "{},{}", cool.position.row, cool.position.col)?;
        writeln!(writer, "{},{}", hot.items, cool.items)?;
        writer.flush()
    }

    fn result(
        &mut self,
        winner: Option<&str>,
        _loser: Option<&str>,
        reason: &str,
    ) -> io::Result<()> {
        let writer = self.writer()?;

        writeln!(writer, "gameend")?;
        match winner {
            Some(name) => writeln!(writer, "{},win,{}", name, reason)?,
            None => writeln!(writer, "draw,draw,{}", reason)?,
        }
        writer.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}
