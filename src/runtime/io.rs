//! CHARI/CHARO channels. Input is line-buffered on the host side and
//! consumed one byte at a time by the program; the buffer-empty flag decides
//! when the next host line is pulled in. Output goes to the screen or to a
//! named file; an in-memory variant backs the unit tests.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, Write};

pub enum InputSource {
    Keyboard,
    File(BufReader<File>),
    Bytes(io::Cursor<Vec<u8>>),
}

pub enum OutputSink {
    Screen,
    File(File),
    Bytes(Vec<u8>),
}

pub struct Io {
    pub source: InputSource,
    pub sink: OutputSink,
    line: Vec<u8>,
    pos: usize,
    buffer_empty: bool,
}

impl Default for Io {
    fn default() -> Io {
        Io {
            source: InputSource::Keyboard,
            sink: OutputSink::Screen,
            line: Vec::new(),
            pos: 0,
            buffer_empty: true,
        }
    }
}

impl Io {
    pub fn is_keyboard(&self) -> bool {
        matches!(self.source, InputSource::Keyboard)
    }

    pub fn is_screen(&self) -> bool {
        matches!(self.sink, OutputSink::Screen)
    }

    /// Discards any half-consumed line so the next CHARI pulls fresh input.
    pub fn reset_buffer(&mut self) {
        self.buffer_empty = true;
    }

    /// One byte for CHARI. Refills the line buffer when the previous line
    /// has been fully delivered (its terminating line feed included).
    pub fn next_char(&mut self) -> io::Result<u8> {
        if self.buffer_empty {
            self.fill_line()?;
        }
        let ch = self.line.get(self.pos).copied().unwrap_or(b'\n');
        self.pos += 1;
        self.buffer_empty = ch == b'\n';
        Ok(ch)
    }

    fn fill_line(&mut self) -> io::Result<()> {
        let mut buf = Vec::new();
        let read = match &mut self.source {
            InputSource::Keyboard => io::stdin().lock().read_until(b'\n', &mut buf)?,
            InputSource::File(reader) => reader.read_until(b'\n', &mut buf)?,
            InputSource::Bytes(cursor) => cursor.read_until(b'\n', &mut buf)?,
        };
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "read past end of file"));
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        buf.push(b'\n');
        self.line = buf;
        self.pos = 0;
        self.buffer_empty = false;
        Ok(())
    }

    /// One byte from CHARO. Line feeds and carriage returns become the host
    /// newline.
    pub fn put_char(&mut self, data: u8) -> io::Result<()> {
        let byte = if data == 0x0A || data == 0x0D { b'\n' } else { data };
        match &mut self.sink {
            OutputSink::Screen => {
                let mut out = io::stdout().lock();
                out.write_all(&[byte])?;
                out.flush()
            }
            OutputSink::File(writer) => writer.write_all(&[byte]),
            OutputSink::Bytes(buf) => {
                buf.push(byte);
                Ok(())
            }
        }
    }

    /// After a run, a file-backed input channel rewinds so the next run
    /// reads it from the top.
    pub fn rewind_input(&mut self) {
        match &mut self.source {
            InputSource::File(reader) => {
                let _ = reader.seek(io::SeekFrom::Start(0));
            }
            InputSource::Bytes(cursor) => cursor.set_position(0),
            InputSource::Keyboard => {}
        }
        self.reset_buffer();
    }
}
