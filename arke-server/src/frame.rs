//! Request/response framing over a byte stream: `u32 length | u8 category | u8 method | payload`
//! for requests, `u32 length | u16 response_code | payload?` for responses. `length` counts
//! every byte that follows it in the same frame.
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

pub struct Request {
    pub category: u8,
    pub method: u8,
    pub payload: Vec<u8>,
}

pub fn read_request(r: &mut impl Read) -> io::Result<Request> {
    let length = r.read_u32::<LittleEndian>()?;
    let category = r.read_u8()?;
    let method = r.read_u8()?;
    let payload_len = length
        .checked_sub(2)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "frame shorter than header"))?;
    let mut payload = vec![0u8; payload_len as usize];
    r.read_exact(&mut payload)?;
    Ok(Request { category, method, payload })
}

pub fn write_response(w: &mut impl Write, response_code: u16, payload: Option<&[u8]>) -> io::Result<()> {
    let body_len = 2 + payload.map_or(0, |p| p.len());
    w.write_u32::<LittleEndian>(body_len as u32)?;
    w.write_u16::<LittleEndian>(response_code)?;
    if let Some(payload) = payload {
        w.write_all(payload)?;
    }
    w.flush()
}
