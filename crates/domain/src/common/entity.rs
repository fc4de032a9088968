use std::fmt;

/// Address-family / NAT mode of a policy list.
///
/// The string forms (`4to4`, `6to6`, …) appear verbatim in the `POLTYPE`
/// output column. `MulticastFour`/`MulticastSix` carry a scalar protocol
/// instead of a service list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeMode {
    FourToFour,
    SixToSix,
    SixToFour,
    FourToSix,
    MulticastFour,
    MulticastSix,
}

impl TypeMode {
    /// All modes in output order.
    pub const ALL: [TypeMode; 6] = [
        TypeMode::FourToFour,
        TypeMode::SixToSix,
        TypeMode::SixToFour,
        TypeMode::FourToSix,
        TypeMode::MulticastFour,
        TypeMode::MulticastSix,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FourToFour => "4to4",
            Self::SixToSix => "6to6",
            Self::SixToFour => "6to4",
            Self::FourToSix => "4to6",
            Self::MulticastFour => "4to4m",
            Self::MulticastSix => "6to6m",
        }
    }

    /// Position within a `Vdom`'s per-mode policy arrays.
    pub fn index(self) -> usize {
        match self {
            Self::FourToFour => 0,
            Self::SixToSix => 1,
            Self::SixToFour => 2,
            Self::FourToSix => 3,
            Self::MulticastFour => 4,
            Self::MulticastSix => 5,
        }
    }

    pub fn is_multicast(self) -> bool {
        matches!(self, Self::MulticastFour | Self::MulticastSix)
    }

    /// Address family of the source column.
    pub fn src_is_v6(self) -> bool {
        matches!(self, Self::SixToSix | Self::SixToFour | Self::MulticastSix)
    }

    /// Address family of the destination column.
    pub fn dst_is_v6(self) -> bool {
        matches!(self, Self::SixToSix | Self::FourToSix | Self::MulticastSix)
    }
}

impl fmt::Display for TypeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Protocol-class mask ─────────────────────────────────────────────
//
// Each stored service value carries a class mask describing which column
// treatment the policy expander applies (port tokens, type/code token,
// or raw pass-through).

pub const CLASS_IP: u8 = 1 << 0;
pub const CLASS_ICMP: u8 = 1 << 1;
pub const CLASS_TCP_UDP_SCTP: u8 = 1 << 2;
pub const CLASS_UNSUPPORTED: u8 = 1 << 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_strings() {
        assert_eq!(TypeMode::FourToFour.as_str(), "4to4");
        assert_eq!(TypeMode::SixToSix.as_str(), "6to6");
        assert_eq!(TypeMode::SixToFour.as_str(), "6to4");
        assert_eq!(TypeMode::FourToSix.as_str(), "4to6");
        assert_eq!(TypeMode::MulticastFour.as_str(), "4to4m");
        assert_eq!(TypeMode::MulticastSix.as_str(), "6to6m");
    }

    #[test]
    fn mode_index_is_position_in_all() {
        for (i, mode) in TypeMode::ALL.iter().enumerate() {
            assert_eq!(mode.index(), i);
        }
    }

    #[test]
    fn multicast_modes() {
        assert!(TypeMode::MulticastFour.is_multicast());
        assert!(TypeMode::MulticastSix.is_multicast());
        assert!(!TypeMode::FourToFour.is_multicast());
        assert!(!TypeMode::SixToFour.is_multicast());
    }

    #[test]
    fn address_families() {
        assert!(!TypeMode::FourToFour.src_is_v6());
        assert!(!TypeMode::FourToFour.dst_is_v6());
        assert!(TypeMode::SixToFour.src_is_v6());
        assert!(!TypeMode::SixToFour.dst_is_v6());
        assert!(!TypeMode::FourToSix.src_is_v6());
        assert!(TypeMode::FourToSix.dst_is_v6());
        assert!(TypeMode::MulticastSix.src_is_v6());
        assert!(TypeMode::MulticastSix.dst_is_v6());
    }

    #[test]
    fn class_bits_are_distinct() {
        let all = [CLASS_IP, CLASS_ICMP, CLASS_TCP_UDP_SCTP, CLASS_UNSUPPORTED];
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                if i != j {
                    assert_eq!(a & b, 0);
                }
            }
        }
    }
}
