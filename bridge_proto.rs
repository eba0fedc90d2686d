//! Host-side codec for the bridge wire format.
//!
//! A frame is a command byte, a burst length in 32-bit words, a word
//! address (network byte order), and for writes the data words. Read
//! replies are the bare data words in the same byte order. This is the
//! format the streaming bridge state machine consumes byte by byte.

use core::fmt;

use crate::io::{Error as IoError, ProtoRead, ProtoWrite, Read, Write};

pub const CMD_WRITE: u8 = 0x01;
pub const CMD_READ: u8 = 0x02;

/// Longest burst expressible in the length byte.
pub const MAX_BURST: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<T> {
    UnknownCommand(u8),
    Io(IoError<T>),
}

impl<T> From<IoError<T>> for Error<T> {
    fn from(value: IoError<T>) -> Error<T> {
        Error::Io(value)
    }
}

impl<T: fmt::Display> fmt::Display for Error<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &Error::UnknownCommand(cmd) => write!(f, "unknown command {:#04x}", cmd),
            &Error::Io(ref err) => write!(f, "{}", err),
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
pub enum Request {
    Write { address: u32, count: u8, data: [u32; MAX_BURST] },
    Read { address: u32, count: u8 },
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &Request::Write { address, count, ref data } => f
                .debug_struct("Write")
                .field("address", &address)
                .field("data", &&data[..count as usize])
                .finish(),
            &Request::Read { address, count } => f
                .debug_struct("Read")
                .field("address", &address)
                .field("count", &count)
                .finish(),
        }
    }
}

impl Request {
    pub fn read_from<R>(reader: &mut R) -> Result<Request, Error<R::ReadError>>
        where R: Read + ?Sized
    {
        match reader.read_u8()? {
            CMD_WRITE => {
                let count = reader.read_u8()?;
                let address = reader.read_u32()?;
                let mut data = [0; MAX_BURST];
                for word in data[..count as usize].iter_mut() {
                    *word = reader.read_u32()?;
                }
                Ok(Request::Write {
                    address: address,
                    count: count,
                    data: data,
                })
            }
            CMD_READ => {
                let count = reader.read_u8()?;
                let address = reader.read_u32()?;
                Ok(Request::Read {
                    address: address,
                    count: count,
                })
            }
            cmd => Err(Error::UnknownCommand(cmd)),
        }
    }

    pub fn write_to<W>(&self, writer: &mut W) -> Result<(), Error<W::WriteError>>
        where W: Write + ?Sized
    {
        match self {
            &Request::Write { address, count, ref data } => {
                writer.write_u8(CMD_WRITE)?;
                writer.write_u8(count)?;
                writer.write_u32(address)?;
                for word in data[..count as usize].iter() {
                    writer.write_u32(*word)?;
                }
            }
            &Request::Read { address, count } => {
                writer.write_u8(CMD_READ)?;
                writer.write_u8(count)?;
                writer.write_u32(address)?;
            }
        }
        Ok(())
    }
}

/// Read the data words a `Read` request returns on the transport.
pub fn read_reply<R>(reader: &mut R, words: &mut [u32]) -> Result<(), IoError<R::ReadError>>
    where R: Read + ?Sized
{
    for word in words.iter_mut() {
        *word = reader.read_u32()?;
    }
    Ok(())
}
