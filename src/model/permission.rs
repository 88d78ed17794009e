//! Capability bits granted through roles.

use std::fmt;
use std::str::FromStr;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// A set of capability bits.
///
/// Roles store their permissions as a plain integer column; this type wraps
/// that integer so checks read as set operations instead of bit twiddling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(u32);

impl Permission {
    /// Follow other users
    pub const FOLLOW: Permission = Permission(0x01);
    /// Comment on questions and answers
    pub const COMMENT: Permission = Permission(0x02);
    /// Ask questions and post answers
    pub const WRITE_ARTICLES: Permission = Permission(0x04);
    /// Moderate other users' comments
    pub const MODERATE_COMMENTS: Permission = Permission(0x08);
    /// Site administration
    pub const ADMINISTER: Permission = Permission(0x80);
    /// Every bit, held by the administrator role
    pub const ALL: Permission = Permission(0xff);

    pub const fn empty() -> Self {
        Permission(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Permission(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True iff every bit of `other` is also set in `self`.
    pub const fn contains(self, other: Permission) -> bool {
        self.0 & other.0 == other.0
    }

    /// Names of the named bits set in this mask, for display in the admin panel.
    pub fn names(self) -> Vec<&'static str> {
        const NAMED: [(Permission, &str); 5] = [
            (Permission::FOLLOW, "follow"),
            (Permission::COMMENT, "comment"),
            (Permission::WRITE_ARTICLES, "write"),
            (Permission::MODERATE_COMMENTS, "moderate"),
            (Permission::ADMINISTER, "administer"),
        ];
        NAMED
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for Permission {
    type Output = Permission;

    fn bitor(self, rhs: Permission) -> Permission {
        Permission(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permission {
    fn bitor_assign(&mut self, rhs: Permission) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permission {
    type Output = Permission;

    fn bitand(self, rhs: Permission) -> Permission {
        Permission(self.0 & rhs.0)
    }
}

impl From<i32> for Permission {
    fn from(value: i32) -> Self {
        Permission(value as u32)
    }
}

impl From<Permission> for i32 {
    fn from(value: Permission) -> Self {
        value.0 as i32
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Parses the admin form value: decimal (`15`) or hex (`0x0f`), at most 8 bits.
impl FromStr for Permission {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => raw.parse::<u32>(),
        };
        match parsed {
            Ok(bits) if bits <= Permission::ALL.0 => Ok(Permission(bits)),
            Ok(bits) => Err(format!("{:#x} does not fit in a role bitmask", bits)),
            Err(e) => Err(format!("invalid permissions {:?}: {}", raw, e)),
        }
    }
}

/// Capability check against an optional role bitmask.
///
/// A principal without a role can do nothing, whatever is requested.
pub fn can(role_permissions: Option<Permission>, requested: Permission) -> bool {
    match role_permissions {
        Some(granted) => granted.contains(requested),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_requires_every_bit() {
        let user = Permission::FOLLOW | Permission::COMMENT | Permission::WRITE_ARTICLES;
        assert!(user.contains(Permission::FOLLOW));
        assert!(user.contains(Permission::FOLLOW | Permission::COMMENT));
        assert!(!user.contains(Permission::MODERATE_COMMENTS));
        assert!(!user.contains(Permission::COMMENT | Permission::ADMINISTER));
        assert!(user.contains(Permission::empty()));
    }

    #[test]
    fn test_can_matches_bitmask_semantics_exhaustively() {
        // Every 8-bit request against every 8-bit grant
        for granted in 0u32..=0xff {
            for requested in 0u32..=0xff {
                let expected = granted & requested == requested;
                assert_eq!(
                    can(Some(Permission::from_bits(granted)), Permission::from_bits(requested)),
                    expected,
                    "granted={granted:#x} requested={requested:#x}"
                );
            }
        }
    }

    #[test]
    fn test_no_role_can_nothing() {
        for requested in 0u32..=0xff {
            assert!(!can(None, Permission::from_bits(requested)));
        }
    }

    #[test]
    fn test_administrator_holds_everything() {
        assert!(Permission::ALL.contains(Permission::ADMINISTER));
        assert!(Permission::ALL.contains(
            Permission::FOLLOW
                | Permission::COMMENT
                | Permission::WRITE_ARTICLES
                | Permission::MODERATE_COMMENTS
        ));
        assert_eq!(Permission::ALL.bits(), 0xff);
    }

    #[test]
    fn test_names_and_display() {
        let moderator = Permission::FOLLOW | Permission::MODERATE_COMMENTS;
        assert_eq!(moderator.names(), vec!["follow", "moderate"]);
        assert_eq!(Permission::ALL.to_string(), "0xff");
        assert_eq!(i32::from(Permission::ADMINISTER), 0x80);
        assert_eq!(Permission::from(0x07), Permission::from_bits(7));
    }

    #[test]
    fn test_parse_form_value() {
        assert_eq!("0x0f".parse::<Permission>().unwrap(), Permission::from_bits(0x0f));
        assert_eq!(" 255 ".parse::<Permission>().unwrap(), Permission::ALL);
        assert!("0x100".parse::<Permission>().is_err());
        assert!("write".parse::<Permission>().is_err());
    }
}
