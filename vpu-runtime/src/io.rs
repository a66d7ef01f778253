//! Host I/O for PUTC/GETC/FOPEN/FCLOSE
//!
//! Streams are numbered: 0 is stdout, 1 is stderr, and FOPEN hands out
//! handles from 2 upward. The captured mode swaps every stream for an
//! in-memory buffer so tests can assert on program output byte for byte.

use std::collections::{HashMap, VecDeque};
use std::fs::OpenOptions;
use std::io::{Read, Write};

use crate::error::{Result, RuntimeError};

pub const STREAM_STDOUT: u64 = 0;
pub const STREAM_STDERR: u64 = 1;

#[derive(Debug)]
enum Sink {
    File(std::fs::File),
    Buffer(Vec<u8>),
}

#[derive(Debug)]
pub struct IoHandler {
    captured: bool,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    stdin: VecDeque<u8>,
    files: HashMap<u64, Sink>,
    next_handle: u64,
}

impl IoHandler {
    /// Pass-through handler wired to the host's stdio and filesystem
    pub fn new() -> Self {
        Self {
            captured: false,
            stdout: Vec::new(),
            stderr: Vec::new(),
            stdin: VecDeque::new(),
            files: HashMap::new(),
            next_handle: 2,
        }
    }

    /// Handler that buffers all streams in memory
    pub fn captured() -> Self {
        Self {
            captured: true,
            ..Self::new()
        }
    }

    /// Queue bytes for GETC to consume (captured mode)
    pub fn feed_stdin(&mut self, bytes: &[u8]) {
        self.stdin.extend(bytes);
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    /// Bytes written to an open handle (captured mode)
    pub fn file_bytes(&self, handle: u64) -> Option<&[u8]> {
        match self.files.get(&handle) {
            Some(Sink::Buffer(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn put_char(&mut self, byte: u8, stream: u64, flush: bool) -> Result<()> {
        match stream {
            STREAM_STDOUT => {
                if self.captured {
                    self.stdout.push(byte);
                } else {
                    let mut out = std::io::stdout();
                    out.write_all(&[byte])?;
                    if flush {
                        out.flush()?;
                    }
                }
            }
            STREAM_STDERR => {
                if self.captured {
                    self.stderr.push(byte);
                } else {
                    let mut err = std::io::stderr();
                    err.write_all(&[byte])?;
                    if flush {
                        err.flush()?;
                    }
                }
            }
            handle => match self.files.get_mut(&handle) {
                Some(Sink::Buffer(bytes)) => bytes.push(byte),
                Some(Sink::File(file)) => {
                    file.write_all(&[byte])?;
                    if flush {
                        file.flush()?;
                    }
                }
                None => return Err(RuntimeError::UnknownStream { stream: handle }),
            },
        }
        Ok(())
    }

    /// Next stdin byte, or -1 at end of input
    pub fn get_char(&mut self) -> i32 {
        if self.captured {
            return self.stdin.pop_front().map(i32::from).unwrap_or(-1);
        }
        if let Some(byte) = self.stdin.pop_front() {
            return byte as i32;
        }
        let mut buf = [0u8; 1];
        match std::io::stdin().read(&mut buf) {
            Ok(1) => buf[0] as i32,
            _ => -1,
        }
    }

    /// Open a file for writing, returning its stream handle
    pub fn fopen(&mut self, path: &str) -> Result<u64> {
        let sink = if self.captured {
            Sink::Buffer(Vec::new())
        } else {
            Sink::File(OpenOptions::new().create(true).append(true).open(path)?)
        };
        let handle = self.next_handle;
        self.next_handle += 1;
        self.files.insert(handle, sink);
        Ok(handle)
    }

    pub fn fclose(&mut self, handle: u64) -> Result<()> {
        match self.files.remove(&handle) {
            Some(_) => Ok(()),
            None => Err(RuntimeError::UnknownStream { stream: handle }),
        }
    }
}

impl Default for IoHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captured_streams() {
        let mut io = IoHandler::captured();
        io.put_char(b'h', STREAM_STDOUT, false).unwrap();
        io.put_char(b'i', STREAM_STDOUT, true).unwrap();
        io.put_char(b'!', STREAM_STDERR, false).unwrap();
        assert_eq!(io.stdout(), b"hi");
        assert_eq!(io.stderr(), b"!");
    }

    #[test]
    fn test_stdin_queue() {
        let mut io = IoHandler::captured();
        io.feed_stdin(b"ab");
        assert_eq!(io.get_char(), b'a' as i32);
        assert_eq!(io.get_char(), b'b' as i32);
        assert_eq!(io.get_char(), -1);
    }

    #[test]
    fn test_file_handles() {
        let mut io = IoHandler::captured();
        let fd = io.fopen("out.txt").unwrap();
        assert_eq!(fd, 2);
        io.put_char(b'x', fd, false).unwrap();
        assert_eq!(io.file_bytes(fd), Some(&b"x"[..]));
        io.fclose(fd).unwrap();
        assert!(io.fclose(fd).is_err());
        assert!(io.put_char(b'x', fd, false).is_err());
    }

    #[test]
    fn test_unknown_stream() {
        let mut io = IoHandler::captured();
        let err = io.put_char(b'x', 9, false).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownStream { stream: 9 }));
    }
}
