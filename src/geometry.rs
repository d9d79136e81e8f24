// Subnet geometry: canvas sizing and address arithmetic

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

// A subnet the renderer cannot lay out on a square canvas.
//
// The canvas side is 2^(h/2) for h host bits, so h must be even: /24 gives a
// 16x16 canvas, /16 gives 256x256, but /23 leaves 9 host bits and there is
// no integer side with side*side = 512.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidSubnet {
    #[error("'{0}' is not valid IPv4 CIDR notation (expected e.g. 192.168.1.0/24)")]
    Cidr(String),

    #[error("prefix length /{0} is out of range for IPv4 (0-32)")]
    Prefix(u32),

    #[error("/{prefix} leaves {host_bits} host bits and cannot fill a square canvas (use an even host-bit count, e.g. /24 or /16)")]
    NotSquare { prefix: u8, host_bits: u8 },
}

// ============================================================================
// SUBNET
// ============================================================================

// An IPv4 CIDR block: base (network) address plus prefix length.
//
// The base is always normalized to the network address, i.e. host bits are
// cleared on construction, matching what nmap is handed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    base: u32,
    prefix: u8,
}

impl Subnet {
    // Create a subnet from an address and prefix length, clearing host bits.
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, InvalidSubnet> {
        if prefix > 32 {
            return Err(InvalidSubnet::Prefix(u32::from(prefix)));
        }
        let mask = if prefix == 0 {
            0
        } else {
            u32::MAX << (32 - prefix)
        };
        Ok(Self {
            base: u32::from(addr) & mask,
            prefix,
        })
    }

    // The network (base) address.
    #[inline]
    pub fn base(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.base)
    }

    #[inline]
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    // Number of host bits; the subnet spans 2^host_bits addresses.
    #[inline]
    pub fn host_bits(&self) -> u8 {
        32 - self.prefix
    }

    // Side length of the square canvas that gives every address in the
    // subnet its own cell.
    //
    // Succeeds only when the address count is a perfect square (even host
    // bits). A /23 must be rejected, never rounded: half its addresses would
    // have no pixel.
    pub fn side(&self) -> Result<u32, InvalidSubnet> {
        let h = self.host_bits();
        if h % 2 != 0 {
            return Err(InvalidSubnet::NotSquare {
                prefix: self.prefix,
                host_bits: h,
            });
        }
        Ok(1u32 << (h / 2))
    }

    // Linear offset of an address relative to the subnet base.
    //
    // Returns None for addresses below the base; offsets past the end of the
    // subnet are handed back as-is and rejected later by the curve mapper,
    // which knows the canvas bounds.
    #[inline]
    pub fn offset_of(&self, addr: Ipv4Addr) -> Option<u32> {
        u32::from(addr).checked_sub(self.base)
    }
}

impl FromStr for Subnet {
    type Err = InvalidSubnet;

    // Parse CIDR notation ("10.0.0.0/24").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| InvalidSubnet::Cidr(s.to_string()))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| InvalidSubnet::Cidr(s.to_string()))?;
        let prefix: u32 = prefix
            .parse()
            .map_err(|_| InvalidSubnet::Cidr(s.to_string()))?;
        if prefix > 32 {
            return Err(InvalidSubnet::Prefix(prefix));
        }
        Self::new(addr, prefix as u8)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base(), self.prefix)
    }
}
