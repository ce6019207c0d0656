//! Simulated payment gateway.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::{PaymentDetails, PaymentMethod, PaymentTransaction};
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Outcome of settling one transaction with the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReceipt {
    pub gateway_payment_id: String,
    pub gateway_signature: String,
    pub payment_details: PaymentDetails,
    pub processed_at: DateTime<Utc>,
}

pub trait PaymentGateway: Send + Sync {
    fn settle(&self, tx: &PaymentTransaction) -> Result<GatewayReceipt, AppError>;
}

/// Always succeeds. Produces masked method details and a signature over
/// `{order_id}|{payment_id}` keyed with the configured secret.
#[derive(Clone)]
pub struct SimulatedGateway {
    signing_secret: String,
}

impl SimulatedGateway {
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
        }
    }

    pub fn sign(&self, order_id: &str, payment_id: &str) -> Result<String, AppError> {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .map_err(|e| AppError::Internal(format!("Invalid signing key: {}", e)))?;
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Ok(bytes) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(self.signing_secret.as_bytes()) else {
            return false;
        };
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        mac.verify_slice(&bytes).is_ok()
    }
}

impl PaymentGateway for SimulatedGateway {
    fn settle(&self, tx: &PaymentTransaction) -> Result<GatewayReceipt, AppError> {
        let reference = tx.id.simple().to_string();
        let gateway_payment_id = format!("pay_{}", &reference[..14]);
        let gateway_signature = self.sign(&tx.gateway_order_id, &gateway_payment_id)?;

        Ok(GatewayReceipt {
            payment_details: masked_details(tx, &reference),
            gateway_payment_id,
            gateway_signature,
            processed_at: Utc::now(),
        })
    }
}

fn masked_details(tx: &PaymentTransaction, reference: &str) -> PaymentDetails {
    let short_ref = &reference[..8];
    let upper_ref = reference[..12].to_ascii_uppercase();

    match tx.method {
        PaymentMethod::Upi => PaymentDetails {
            upi_id: Some(format!("user{}@upi", short_ref)),
            upi_transaction_id: Some(format!("UPI{}", upper_ref)),
            ..PaymentDetails::default()
        },
        PaymentMethod::CreditCard | PaymentMethod::DebitCard => PaymentDetails {
            card_last4: Some(format!("{:04}", tx.id.as_u128() % 10_000)),
            card_type: Some(
                if tx.method == PaymentMethod::CreditCard {
                    "CREDIT"
                } else {
                    "DEBIT"
                }
                .to_string(),
            ),
            card_network: Some("VISA".to_string()),
            ..PaymentDetails::default()
        },
        PaymentMethod::NetBanking | PaymentMethod::BankTransfer => PaymentDetails {
            bank_name: Some("HDFC Bank".to_string()),
            bank_transaction_id: Some(format!("BNK{}", upper_ref)),
            ..PaymentDetails::default()
        },
        PaymentMethod::Wallet => PaymentDetails {
            wallet_name: Some("Paytm".to_string()),
            wallet_transaction_id: Some(format!("WLT{}", upper_ref)),
            ..PaymentDetails::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TransactionDraft, TransactionType};
    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    fn transaction(method: PaymentMethod) -> PaymentTransaction {
        PaymentTransaction::new(
            TransactionDraft {
                franchise_id: Uuid::new_v4(),
                application_id: None,
                payment_request_id: None,
                transaction_type: TransactionType::ApplicationFee,
                method,
                amount: BigDecimal::from(5000),
                currency: None,
                description: None,
                status: None,
                gateway_order_id: None,
            },
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_signature_verifies() {
        let gateway = SimulatedGateway::new("secret");
        let tx = transaction(PaymentMethod::Upi);
        let receipt = gateway.settle(&tx).unwrap();

        assert!(gateway.verify(
            &tx.gateway_order_id,
            &receipt.gateway_payment_id,
            &receipt.gateway_signature
        ));
        assert!(!SimulatedGateway::new("other").verify(
            &tx.gateway_order_id,
            &receipt.gateway_payment_id,
            &receipt.gateway_signature
        ));
    }

    #[test]
    fn test_upi_details_are_masked() {
        let receipt = SimulatedGateway::new("s")
            .settle(&transaction(PaymentMethod::Upi))
            .unwrap();
        let upi_id = receipt.payment_details.upi_id.unwrap();
        assert!(upi_id.starts_with("user") && upi_id.ends_with("@upi"));
        assert!(receipt.payment_details.card_last4.is_none());
    }

    #[test]
    fn test_card_details() {
        let tx = transaction(PaymentMethod::DebitCard);
        let details = SimulatedGateway::new("s").settle(&tx).unwrap().payment_details;
        assert_eq!(details.card_last4.as_deref().map(str::len), Some(4));
        assert_eq!(details.card_type.as_deref(), Some("DEBIT"));
        assert_eq!(details.card_network.as_deref(), Some("VISA"));
    }

    #[test]
    fn test_bank_transfer_uses_bank_fields() {
        let details = SimulatedGateway::new("s")
            .settle(&transaction(PaymentMethod::BankTransfer))
            .unwrap()
            .payment_details;
        assert_eq!(details.bank_name.as_deref(), Some("HDFC Bank"));
        assert!(details.bank_transaction_id.unwrap().starts_with("BNK"));
    }
}
