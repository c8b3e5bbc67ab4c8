//! Signing and verification of online (Xbox LIVE) account records.
//!
//! ## Layout (0x6C bytes)
//! ```text
//! [0x00] XUID          (u64 LE)
//! [0x08] XUID flags    (u32 LE, must be zero)
//! [0x0C] Gamertag      (0x10 bytes, last byte must be zero)
//! [0x1C] Flags         (u32 LE, low nibble of byte 0x1F must be zero)
//! [0x20] Passcode      (4 button bytes)
//! [0x24] Domain        (0x14 bytes, last byte must be zero)
//! [0x38] Realm         (0x18 bytes, last byte must be zero)
//! [0x50] Confounder    (0x14 bytes, first 0x10 3DES-CBC encrypted)
//! [0x64] Verification  (8 bytes, truncated HMAC-SHA1)
//! ```
//!
//! ## Signing
//!
//! 1. `digest = HMAC-SHA1(auth_key, account[..0x64])` over the plaintext
//! 2. `des_key = HMAC-SHA1(SEED_KEY_A, seed)[..4] || HMAC-SHA1(SEED_KEY_B, seed)`
//! 3. `confounder[..0x10] = 3DES-CBC(des_key, IV, confounder[..0x10])`
//! 4. `verification = digest[..8]`
//!
//! Verification undoes step 3 and recomputes the digest. A roaming account
//! (memory unit) uses the fixed seed and auth key below; a machine account
//! uses the console's HDD key for both, which ties it to that console.

use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::TdesEde3;
use hmac::Mac;
use log::debug;

use super::{DIGEST_SIZE, MAC_KEY_SIZE, hmac_sha1, new_mac};
use crate::{Error, Result};

/// Size of an account record.
pub const ACCOUNT_SIZE: usize = 0x6C;
/// Number of leading bytes covered by the signature.
pub const SIGNED_SIZE: usize = 0x64;
/// Size of the stored verification bytes.
pub const VERIFICATION_SIZE: usize = ACCOUNT_SIZE - SIGNED_SIZE;
/// Offset of the confounder.
pub const CONFOUNDER_OFFSET: usize = 0x50;
/// Bytes of the confounder that pass through 3DES.
pub const ENCRYPTED_CONFOUNDER_SIZE: usize = 0x10;
/// Size of the derived 3DES (EDE3) key.
pub const DES_KEY_SIZE: usize = 0x18;

const SEED_DATA: [u8; MAC_KEY_SIZE] = [
    0xA7, 0x14, 0x21, 0x3D, 0x94, 0x46, 0x1E, 0x05, 0x97, 0x6D, 0xE8, 0x35, 0x21, 0x2A, 0xE5, 0x7C,
];

const SEED_KEY_A: [u8; MAC_KEY_SIZE] = [
    0x2B, 0xB8, 0xD9, 0xEF, 0xD2, 0x04, 0x6D, 0x9D, 0x1F, 0x39, 0xB1, 0x5B, 0x46, 0x58, 0x01, 0xD7,
];

const SEED_KEY_B: [u8; MAC_KEY_SIZE] = [
    0x1E, 0x05, 0xD7, 0x3A, 0xA4, 0x20, 0x6A, 0x7B, 0xA0, 0x5B, 0xCD, 0xDF, 0xAD, 0x26, 0xD3, 0xDE,
];

const AUTH_KEY: [u8; MAC_KEY_SIZE] = [
    0x62, 0xBD, 0x92, 0xB6, 0x4F, 0x45, 0x84, 0x70, 0xD3, 0xFF, 0x4F, 0x22, 0x3C, 0x6E, 0xE7, 0xEA,
];

const IV: [u8; 8] = [0x7B, 0x35, 0xA8, 0xB7, 0x27, 0xED, 0x43, 0x7A];

type TdesCbcEnc = cbc::Encryptor<TdesEde3>;
type TdesCbcDec = cbc::Decryptor<TdesEde3>;

/// Which keys an account is signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKeys {
    /// Fixed keys; the account can be used on any console.
    Roaming,
    /// Bound to one console through its HDD key (from the EEPROM).
    Machine([u8; MAC_KEY_SIZE]),
}

impl AccountKeys {
    fn seed(&self) -> &[u8; MAC_KEY_SIZE] {
        match self {
            AccountKeys::Roaming => &SEED_DATA,
            AccountKeys::Machine(hdd_key) => hdd_key,
        }
    }

    fn auth_key(&self) -> &[u8; MAC_KEY_SIZE] {
        match self {
            AccountKeys::Roaming => &AUTH_KEY,
            AccountKeys::Machine(hdd_key) => hdd_key,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AccountKeys::Roaming => "roaming",
            AccountKeys::Machine(_) => "machine",
        }
    }

    /// The 3DES key used for the confounder.
    pub fn des_key(&self) -> [u8; DES_KEY_SIZE] {
        let a = hmac_sha1(&SEED_KEY_A, self.seed());
        let b = hmac_sha1(&SEED_KEY_B, self.seed());

        let mut key = [0u8; DES_KEY_SIZE];
        key[..4].copy_from_slice(&a[..4]);
        key[4..].copy_from_slice(&b[..DIGEST_SIZE]);
        key
    }
}

fn confounder_mut(account: &mut [u8; ACCOUNT_SIZE]) -> &mut [u8] {
    &mut account[CONFOUNDER_OFFSET..CONFOUNDER_OFFSET + ENCRYPTED_CONFOUNDER_SIZE]
}

fn encrypt_confounder(account: &mut [u8; ACCOUNT_SIZE], key: &[u8; DES_KEY_SIZE]) {
    let mut cipher = TdesCbcEnc::new(GenericArray::from_slice(key), GenericArray::from_slice(&IV));
    for block in confounder_mut(account).chunks_exact_mut(8) {
        cipher.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

fn decrypt_confounder(account: &mut [u8; ACCOUNT_SIZE], key: &[u8; DES_KEY_SIZE]) {
    let mut cipher = TdesCbcDec::new(GenericArray::from_slice(key), GenericArray::from_slice(&IV));
    for block in confounder_mut(account).chunks_exact_mut(8) {
        cipher.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

// Field rules the online stack enforces on top of the signature.
fn check_fields(account: &[u8; ACCOUNT_SIZE]) -> Result<()> {
    if account[0x1F] & 0xF != 0 {
        return Err(Error::InvalidAccount("reserved flag bits set"));
    }
    if account[0x08..0x0C] != [0u8; 4] {
        return Err(Error::InvalidAccount("XUID flags not zero"));
    }
    if account[0x1B] != 0 {
        return Err(Error::InvalidAccount("gamertag not terminated"));
    }
    if account[0x37] != 0 {
        return Err(Error::InvalidAccount("domain not terminated"));
    }
    if account[0x4F] != 0 {
        return Err(Error::InvalidAccount("realm not terminated"));
    }
    Ok(())
}

/// Sign a plaintext account in place.
///
/// Encrypts the first 0x10 confounder bytes and overwrites the verification
/// bytes. Field rules are not checked; [`decrypt_account`] enforces them.
pub fn sign_account(account: &mut [u8; ACCOUNT_SIZE], keys: &AccountKeys) {
    let digest = hmac_sha1(keys.auth_key(), &account[..SIGNED_SIZE]);
    encrypt_confounder(account, &keys.des_key());
    account[SIGNED_SIZE..].copy_from_slice(&digest[..VERIFICATION_SIZE]);
    debug!("signed {} account", keys.label());
}

/// Verify a signed account and decrypt its confounder in place.
///
/// Returns [`Error::VerificationFailed`] if the verification bytes do not
/// match and [`Error::InvalidAccount`] if a field breaks the online rules.
/// `account` is only written on success.
pub fn decrypt_account(account: &mut [u8; ACCOUNT_SIZE], keys: &AccountKeys) -> Result<()> {
    let mut plain = *account;
    decrypt_confounder(&mut plain, &keys.des_key());

    let mut mac = new_mac(keys.auth_key());
    mac.update(&plain[..SIGNED_SIZE]);
    mac.verify_truncated_left(&plain[SIGNED_SIZE..])
        .map_err(|_| Error::VerificationFailed)?;
    check_fields(&plain)?;

    *account = plain;
    debug!("verified {} account", keys.label());
    Ok(())
}

/// Check a signed account without modifying it.
pub fn verify_account(account: &[u8; ACCOUNT_SIZE], keys: &AccountKeys) -> Result<()> {
    let mut scratch = *account;
    decrypt_account(&mut scratch, keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HDD_KEY: [u8; MAC_KEY_SIZE] = [
        0xA0, 0xA7, 0xAE, 0xB5, 0xBC, 0x83, 0x8A, 0x91, 0x98, 0x9F, 0xE6, 0xED, 0xF4, 0xFB, 0xC2,
        0xC9,
    ];

    // Confounder and verification bytes of `plain_account()` once signed,
    // produced by an independent HMAC-SHA1 + 3DES-CBC implementation.
    const ROAMING_TAIL: [u8; 0x1C] = [
        0xFB, 0xA1, 0x91, 0x1F, 0x0B, 0x47, 0x99, 0x80, 0x48, 0xA8, 0xF8, 0x5F,
        0x57, 0xC9, 0xE2, 0x55, 0xE0, 0xEB, 0xF6, 0x01, 0x7A, 0xF0, 0x1A, 0x5C,
        0xD0, 0xF8, 0x5B, 0xDE,
    ];

    const MACHINE_TAIL: [u8; 0x1C] = [
        0xCF, 0x6A, 0x7C, 0x83, 0xF7, 0x1B, 0x9A, 0x3A, 0x77, 0x38, 0x73, 0x6F,
        0x1D, 0xCD, 0xEB, 0x19, 0xE0, 0xEB, 0xF6, 0x01, 0x58, 0x1E, 0x0D, 0x7F,
        0x18, 0x13, 0x4F, 0x40,
    ];

    fn plain_account() -> [u8; ACCOUNT_SIZE] {
        let mut a = [0u8; ACCOUNT_SIZE];
        a[0x00..0x08].copy_from_slice(&0x0009_0000_1234_5678u64.to_le_bytes());
        a[0x0C..0x13].copy_from_slice(b"Gamer01");
        a[0x1C..0x20].copy_from_slice(&1u32.to_le_bytes());
        a[0x20..0x24].copy_from_slice(&[1, 2, 5, 6]);
        a[0x24..0x2C].copy_from_slice(b"xbox.com");
        a[0x38..0x44].copy_from_slice(b"PASSPORT.NET");
        for (i, b) in a[0x50..0x64].iter_mut().enumerate() {
            *b = 0x30u8.wrapping_add(i as u8 * 11);
        }
        a
    }

    #[test]
    fn roaming_des_key_matches_precomputed() {
        assert_eq!(
            AccountKeys::Roaming.des_key(),
            [
                0x2B, 0x84, 0x95, 0xE8, 0x82, 0xE2, 0xA3, 0x03, 0x03, 0x30, 0x60, 0x6D, 0x8A,
                0xDA, 0x8B, 0x26, 0x93, 0x4E, 0x3A, 0x9D, 0xF6, 0xF5, 0xB8, 0xFA,
            ]
        );
    }

    #[test]
    fn sign_matches_known_answers() {
        for (keys, tail) in [
            (AccountKeys::Roaming, ROAMING_TAIL),
            (AccountKeys::Machine(HDD_KEY), MACHINE_TAIL),
        ] {
            let plain = plain_account();
            let mut account = plain;
            sign_account(&mut account, &keys);
            assert_eq!(account[..CONFOUNDER_OFFSET], plain[..CONFOUNDER_OFFSET]);
            assert_eq!(account[CONFOUNDER_OFFSET..], tail, "{keys:?}");
        }
    }

    #[test]
    fn decrypt_inverts_sign() {
        for keys in [AccountKeys::Roaming, AccountKeys::Machine(HDD_KEY)] {
            let mut account = plain_account();
            sign_account(&mut account, &keys);
            let signed = account;

            verify_account(&account, &keys).unwrap();
            assert_eq!(account, signed);

            decrypt_account(&mut account, &keys).unwrap();
            assert_eq!(account[..SIGNED_SIZE], plain_account()[..SIGNED_SIZE]);
            assert_eq!(account[SIGNED_SIZE..], signed[SIGNED_SIZE..]);
        }
    }

    #[test]
    fn wrong_keys_fail_verification() {
        let mut account = plain_account();
        sign_account(&mut account, &AccountKeys::Roaming);

        let before = account;
        assert!(matches!(
            decrypt_account(&mut account, &AccountKeys::Machine(HDD_KEY)),
            Err(Error::VerificationFailed)
        ));
        assert_eq!(account, before);
    }

    #[test]
    fn tampering_fails_verification() {
        let mut signed = plain_account();
        sign_account(&mut signed, &AccountKeys::Roaming);

        for offset in [0x00, 0x0C, 0x24, 0x50, 0x5F, 0x63, 0x64, 0x6B] {
            let mut tampered = signed;
            tampered[offset] ^= 0x01;
            assert!(
                matches!(
                    verify_account(&tampered, &AccountKeys::Roaming),
                    Err(Error::VerificationFailed)
                ),
                "offset {offset:#X}"
            );
        }
    }

    #[test]
    fn field_rules_are_enforced_after_signature() {
        let cases: [(usize, u8, &str); 5] = [
            (0x1F, 0x01, "reserved flag bits set"),
            (0x08, 0x01, "XUID flags not zero"),
            (0x1B, b'x', "gamertag not terminated"),
            (0x37, b'x', "domain not terminated"),
            (0x4F, b'x', "realm not terminated"),
        ];
        for (offset, value, reason) in cases {
            let mut account = plain_account();
            account[offset] = value;
            sign_account(&mut account, &AccountKeys::Roaming);

            let before = account;
            assert!(matches!(
                decrypt_account(&mut account, &AccountKeys::Roaming),
                Err(Error::InvalidAccount(r)) if r == reason
            ));
            assert_eq!(account, before);
        }
    }

    #[test]
    fn upper_flag_bits_are_allowed() {
        let mut account = plain_account();
        account[0x1F] = 0xF0;
        sign_account(&mut account, &AccountKeys::Roaming);
        verify_account(&account, &AccountKeys::Roaming).unwrap();
    }

    #[test]
    fn confounder_tail_is_not_encrypted() {
        let mut account = plain_account();
        sign_account(&mut account, &AccountKeys::Roaming);
        assert_eq!(account[0x60..0x64], plain_account()[0x60..0x64]);
        assert_ne!(account[0x50..0x60], plain_account()[0x50..0x60]);
    }
}
