//! Domain entities.
//! Framework-agnostic representation of users, franchises, applications,
//! payments and notifications. Persistence adapters map these to rows.

pub mod application;
pub mod franchise;
pub mod money;
pub mod notification;
pub mod payment;
pub mod user;

pub use application::{
    Address, Application, ApplicationDocument, ApplicationDraft, ApplicationPatch,
    ApplicationStatus, BusinessInfo, DocumentType, FinancialInfo, NewDocument, PaymentStatus,
    PersonalInfo, Reference, ReferenceType,
};
pub use franchise::{Franchise, FranchiseStatus};
pub use notification::{Notification, NotificationType};
pub use payment::{
    FeeBreakdown, PaymentDetails, PaymentMethod, PaymentRequest, PaymentRequestDraft,
    PaymentRequestStatus, PaymentRequestType, PaymentTransaction, TransactionDraft,
    TransactionStatus, TransactionType,
};
pub use user::{User, UserRole};

/// Raised when a stored or submitted label does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum whose
/// stored form is the SCREAMING_SNAKE_CASE label also used on the wire.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::domain::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use text_enum;
