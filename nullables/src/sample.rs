//! Deterministic sample data: addresses and key material derived from a seed.

use xchain_types::hash::blake2b_256_multi;
use xchain_types::Address;

const CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// A well-formed address derived from `seed`. Distinct seeds give distinct
/// addresses.
pub fn address(seed: u64) -> Address {
    let mut data = String::with_capacity(Address::DATA_LEN);
    let mut round = 0u64;
    while data.len() < Address::DATA_LEN {
        let digest = blake2b_256_multi(&[b"address", &seed.to_be_bytes(), &round.to_be_bytes()]);
        for byte in digest {
            if data.len() == Address::DATA_LEN {
                break;
            }
            data.push(CHARSET[(byte % 32) as usize] as char);
        }
        round += 1;
    }
    Address::new(format!("{}{}", Address::PREFIX, data))
}

/// `n` distinct addresses, sorted.
pub fn addresses(n: usize) -> Vec<Address> {
    let mut out: Vec<Address> = (0..n as u64).map(address).collect();
    out.sort();
    out
}

/// A hex string standing in for a TSS public key.
pub fn pubkey(seed: u64) -> String {
    hex::encode(blake2b_256_multi(&[b"pubkey", &seed.to_be_bytes()]))
}

/// A `0x`-prefixed 20-byte hex contract address.
pub fn evm_address(seed: u64) -> String {
    let digest = blake2b_256_multi(&[b"evm", &seed.to_be_bytes()]);
    format!("0x{}", hex::encode(&digest[..20]))
}
