/*!
Byte-slice reading utilities for decoding big-endian MRT payload fields.
*/
use crate::error::ParserError;
use crate::models::Afi;
use bytes::{Buf, Bytes};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[cold]
fn eof(name: &'static str, expected: usize, found: usize) -> ParserError {
    ParserError::InsufficientData {
        name,
        expected,
        found,
    }
}

/// Bounds-checked reads over a record payload. Every method either consumes
/// exactly the bytes it names or fails with `InsufficientData`, leaving the
/// caller free to drop the record and move on.
pub trait ReadUtils {
    fn require_n_remaining(&self, n: usize, name: &'static str) -> Result<(), ParserError>;
    fn read_u8(&mut self) -> Result<u8, ParserError>;
    fn read_u16(&mut self) -> Result<u16, ParserError>;
    fn read_u32(&mut self) -> Result<u32, ParserError>;
    fn read_n_bytes(&mut self, n: usize) -> Result<Bytes, ParserError>;
    fn read_ipv4_address(&mut self) -> Result<Ipv4Addr, ParserError>;
    fn read_ipv6_address(&mut self) -> Result<Ipv6Addr, ParserError>;

    fn read_address(&mut self, afi: Afi) -> Result<IpAddr, ParserError> {
        match afi {
            Afi::Ipv4 => self.read_ipv4_address().map(IpAddr::V4),
            Afi::Ipv6 => self.read_ipv6_address().map(IpAddr::V6),
        }
    }
}

impl ReadUtils for Bytes {
    #[inline(always)]
    fn require_n_remaining(&self, n: usize, name: &'static str) -> Result<(), ParserError> {
        if self.remaining() >= n {
            return Ok(());
        }
        Err(eof(name, n, self.remaining()))
    }

    #[inline(always)]
    fn read_u8(&mut self) -> Result<u8, ParserError> {
        self.require_n_remaining(1, "u8")?;
        Ok(self.get_u8())
    }

    #[inline(always)]
    fn read_u16(&mut self) -> Result<u16, ParserError> {
        self.require_n_remaining(2, "u16")?;
        Ok(self.get_u16())
    }

    #[inline(always)]
    fn read_u32(&mut self) -> Result<u32, ParserError> {
        self.require_n_remaining(4, "u32")?;
        Ok(self.get_u32())
    }

    fn read_n_bytes(&mut self, n: usize) -> Result<Bytes, ParserError> {
        self.require_n_remaining(n, "raw bytes")?;
        Ok(self.split_to(n))
    }

    fn read_ipv4_address(&mut self) -> Result<Ipv4Addr, ParserError> {
        self.require_n_remaining(4, "IPv4 address")?;
        Ok(Ipv4Addr::from(self.get_u32()))
    }

    fn read_ipv6_address(&mut self) -> Result<Ipv6Addr, ParserError> {
        self.require_n_remaining(16, "IPv6 address")?;
        let mut buffer = [0u8; 16];
        self.copy_to_slice(&mut buffer);
        Ok(Ipv6Addr::from(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_reads() {
        let mut data = Bytes::from_static(&[0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03]);
        assert_eq!(data.read_u8().unwrap(), 1);
        assert_eq!(data.read_u16().unwrap(), 2);
        assert_eq!(data.read_u32().unwrap(), 3);
        assert!(matches!(
            data.read_u8(),
            Err(ParserError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_read_addresses() {
        let mut data = Bytes::from_static(&[192, 0, 2, 1]);
        assert_eq!(
            data.read_ipv4_address().unwrap(),
            Ipv4Addr::new(192, 0, 2, 1)
        );

        let mut data = Bytes::from_static(&[
            0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
        ]);
        assert_eq!(
            data.read_address(Afi::Ipv6).unwrap(),
            "2001:db8::1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_read_n_bytes_underrun() {
        let mut data = Bytes::from_static(&[1, 2, 3]);
        assert!(data.read_n_bytes(4).is_err());
        assert_eq!(data.read_n_bytes(3).unwrap().as_ref(), &[1, 2, 3]);
    }
}
