//! Revoke calldata decoder
//! Reads the ERC-20 `approve` calldata carried by revoke candidates

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use std::str::FromStr;

use crate::models::types::{Approval, RevokeCandidate};

// ERC-20 allowance function
sol! {
    function approve(address spender, uint256 amount) external returns (bool);
}

/// Decoder for revoke candidates
pub struct RevokeDecoder;

impl RevokeDecoder {
    /// Decode `approve(spender, amount)` from hex calldata.
    /// Returns None if the calldata is not an approve call
    pub fn decode_approve(calldata: &str) -> Option<(Address, U256)> {
        let bytes = Bytes::from_str(calldata.trim()).ok()?;
        Self::decode_approve_bytes(&bytes)
    }

    pub fn decode_approve_bytes(data: &[u8]) -> Option<(Address, U256)> {
        if data.len() < 4 {
            return None;
        }
        let call = approveCall::abi_decode(data, false).ok()?;
        Some((call.spender, call.amount))
    }

    /// Build the calldata that sets `spender`'s allowance to zero
    pub fn encode_revoke(spender: Address) -> Bytes {
        Bytes::from(
            approveCall {
                spender,
                amount: U256::ZERO,
            }
            .abi_encode(),
        )
    }

    /// True when the candidate zeroes this approval's allowance:
    /// sent to the approval's token, `approve(spender, 0)` for its spender
    pub fn is_revoke_of(candidate: &RevokeCandidate, approval: &Approval) -> bool {
        let (Some(to), Some(token), Some(spender)) = (
            parse_address(&candidate.to),
            parse_address(&approval.token_address),
            parse_address(&approval.spender),
        ) else {
            return false;
        };
        if to != token {
            return false;
        }
        matches!(
            Self::decode_approve(&candidate.data),
            Some((revoked, amount)) if revoked == spender && amount.is_zero()
        )
    }
}

fn parse_address(raw: &str) -> Option<Address> {
    Address::from_str(raw.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDT: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
    const ROUTER: &str = "0x1111111254EEB25477B68fb85Ed929f73A960582";

    fn approval() -> Approval {
        Approval {
            token_address: USDT.to_string(),
            token_name: "USDT".to_string(),
            spender: ROUTER.to_string(),
            spender_name: None,
            amount: "1000".to_string(),
            is_unlimited: false,
            risk_score: 80,
        }
    }

    fn candidate(to: &str, data: Bytes) -> RevokeCandidate {
        RevokeCandidate {
            to: to.to_string(),
            data: data.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_decode_revoke_calldata() {
        let spender = Address::from_str(ROUTER).unwrap();
        let data = RevokeDecoder::encode_revoke(spender);

        // selector 0x095ea7b3 + two words
        assert_eq!(data.len(), 68);
        assert_eq!(&data[..4], &[0x09, 0x5e, 0xa7, 0xb3]);

        let (decoded, amount) = RevokeDecoder::decode_approve(&data.to_string()).unwrap();
        assert_eq!(decoded, spender);
        assert!(amount.is_zero());
    }

    #[test]
    fn test_rejects_non_approve_calldata() {
        assert!(RevokeDecoder::decode_approve("0x").is_none());
        assert!(RevokeDecoder::decode_approve("not hex").is_none());
        assert!(RevokeDecoder::decode_approve("0xa9059cbb").is_none());
    }

    #[test]
    fn test_matches_candidate_to_approval() {
        let spender = Address::from_str(ROUTER).unwrap();
        let revoke = candidate(&USDT.to_lowercase(), RevokeDecoder::encode_revoke(spender));
        assert!(RevokeDecoder::is_revoke_of(&revoke, &approval()));
    }

    #[test]
    fn test_wrong_token_or_nonzero_amount_do_not_match() {
        let spender = Address::from_str(ROUTER).unwrap();

        let other_token = candidate(
            "0x6B175474E89094C44Da98b954EedeAC495271d0F",
            RevokeDecoder::encode_revoke(spender),
        );
        assert!(!RevokeDecoder::is_revoke_of(&other_token, &approval()));

        let raise = Bytes::from(
            approveCall {
                spender,
                amount: U256::MAX,
            }
            .abi_encode(),
        );
        assert!(!RevokeDecoder::is_revoke_of(&candidate(USDT, raise), &approval()));
    }
}
