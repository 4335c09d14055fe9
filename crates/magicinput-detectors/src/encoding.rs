//! Encoded-value detectors: base64 payloads, digests, prefixed integer
//! literals and cryptocurrency addresses

use crate::detector::{compile, preview, single_token, Detector};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use magicinput_core::{ClassificationResult, FormatType, Result};
use regex::Regex;
use sha2::{Digest, Sha256};

/// Base64 payload detector
pub struct Base64Detector {
    alphabet: Regex,
}

impl Base64Detector {
    const MIN_LEN: usize = 12;
    const PREVIEW_CHARS: usize = 120;

    pub fn new() -> Result<Self> {
        Ok(Self {
            alphabet: compile("base64", r"^[A-Za-z0-9+/]+={0,2}$")?,
        })
    }

    fn printable(bytes: &[u8]) -> Option<&str> {
        let text = std::str::from_utf8(bytes).ok()?;
        let clean = !text
            .chars()
            .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'));
        clean.then_some(text)
    }
}

impl Detector for Base64Detector {
    fn name(&self) -> &str {
        "base64"
    }

    fn format(&self) -> FormatType {
        FormatType::Base64
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let token = single_token(content)?;
        if token.len() < Self::MIN_LEN || token.len() % 4 != 0 || !self.alphabet.is_match(token) {
            return None;
        }
        // Pure words ("HelloWorldAbc") are valid base64 but almost never intended as such.
        if token.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let bytes = STANDARD.decode(token).ok()?;
        let result = match Self::printable(&bytes) {
            Some(text) => ClassificationResult::new(FormatType::Base64, 70, "Base64")
                .with_field("Decoded", preview(text, Self::PREVIEW_CHARS))
                .with_field("Payload", "text"),
            None => ClassificationResult::new(FormatType::Base64, 45, "Base64")
                .with_field("Payload", "binary"),
        };
        Some(result.with_field("Bytes", bytes.len().to_string()))
    }
}

/// Hex digest detector (MD5, SHA-1, SHA-256, SHA-512)
pub struct HashDetector;

impl HashDetector {
    fn algorithm(len: usize) -> Option<&'static str> {
        match len {
            32 => Some("MD5"),
            40 => Some("SHA-1"),
            64 => Some("SHA-256"),
            128 => Some("SHA-512"),
            _ => None,
        }
    }
}

impl Detector for HashDetector {
    fn name(&self) -> &str {
        "hash"
    }

    fn format(&self) -> FormatType {
        FormatType::Hash
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let token = single_token(content)?;
        let algorithm = Self::algorithm(token.len())?;
        if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        Some(
            ClassificationResult::new(FormatType::Hash, 75, "Hash")
                .with_field("Algorithm", algorithm)
                .with_field("Bits", (token.len() * 4).to_string()),
        )
    }
}

/// `0x` / `0b` / `0o` integer literal detector
pub struct NumberBaseDetector {
    literal: Regex,
}

impl NumberBaseDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            literal: compile("number base", r"^0([xXbBoO])([0-9a-fA-F_]+)$")?,
        })
    }
}

impl Detector for NumberBaseDetector {
    fn name(&self) -> &str {
        "number_base"
    }

    fn format(&self) -> FormatType {
        FormatType::NumberBase
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let token = single_token(content)?;
        let caps = self.literal.captures(token)?;
        let (radix, label) = match caps[1].to_ascii_lowercase().as_str() {
            "x" => (16, "Hexadecimal"),
            "b" => (2, "Binary"),
            _ => (8, "Octal"),
        };

        let digits: String = caps[2].chars().filter(|c| *c != '_').collect();
        if digits.is_empty() {
            return None;
        }
        // Anything wider than 128 bits (e.g. an Ethereum address) is not a number literal.
        let value = u128::from_str_radix(&digits, radix).ok()?;

        Some(
            ClassificationResult::new(FormatType::NumberBase, 80, label)
                .with_field("Decimal", value.to_string())
                .with_field("Hex", format!("0x{:X}", value))
                .with_field("Octal", format!("0o{:o}", value))
                .with_field("Binary", format!("0b{:b}", value)),
        )
    }
}

const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const BECH32_GENERATORS: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
const BECH32M_CONST: u32 = 0x2bc830a3;
const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

fn bech32_polymod(values: impl IntoIterator<Item = u8>) -> u32 {
    let mut chk: u32 = 1;
    for v in values {
        let top = chk >> 25;
        chk = ((chk & 0x1ff_ffff) << 5) ^ u32::from(v);
        for (i, generator) in BECH32_GENERATORS.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= generator;
            }
        }
    }
    chk
}

/// Verify a bech32/bech32m checksum, returning the witness version character
fn bech32_verify(address: &str) -> Option<char> {
    let (hrp, data) = address.rsplit_once('1')?;
    let values: Vec<u8> = data
        .chars()
        .map(|c| BECH32_CHARSET.find(c).map(|i| i as u8))
        .collect::<Option<_>>()?;

    let expanded = hrp
        .bytes()
        .map(|b| b >> 5)
        .chain(std::iter::once(0))
        .chain(hrp.bytes().map(|b| b & 31))
        .chain(values.iter().copied());
    match bech32_polymod(expanded) {
        1 | BECH32M_CONST => data.chars().next(),
        _ => None,
    }
}

fn base58_decode(text: &str) -> Option<Vec<u8>> {
    let mut bytes: Vec<u8> = Vec::new();
    for c in text.chars() {
        let mut carry = BASE58_ALPHABET.find(c)? as u32;
        for byte in bytes.iter_mut().rev() {
            carry += u32::from(*byte) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.insert(0, (carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    let zeros = text.chars().take_while(|c| *c == '1').count();
    let mut decoded = vec![0u8; zeros];
    decoded.extend(bytes);
    Some(decoded)
}

/// Ethereum and Bitcoin address detector
pub struct CryptoAddressDetector {
    ethereum: Regex,
    bech32: Regex,
    base58: Regex,
}

impl CryptoAddressDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            ethereum: compile("ethereum address", r"^0x[0-9a-fA-F]{40}$")?,
            bech32: compile("bech32 address", r"^(bc1|tb1)[02-9ac-hj-np-z]{11,71}$")?,
            base58: compile("base58 address", r"^[13][1-9A-HJ-NP-Za-km-z]{25,34}$")?,
        })
    }

    fn ethereum(token: &str) -> ClassificationResult {
        let digits = &token[2..];
        let mixed = digits.chars().any(|c| c.is_ascii_uppercase())
            && digits.chars().any(|c| c.is_ascii_lowercase());
        ClassificationResult::new(FormatType::CryptoAddress, 88, "Ethereum Address")
            .with_field("Network", "Ethereum")
            .with_field("Case", if mixed { "mixed (EIP-55)" } else { "uniform" })
    }

    fn bech32(&self, token: &str) -> Option<ClassificationResult> {
        let lower = token.to_ascii_lowercase();
        if token != lower && token != token.to_ascii_uppercase() {
            return None;
        }
        if !self.bech32.is_match(&lower) {
            return None;
        }
        let witness = bech32_verify(&lower)?;
        let network = if lower.starts_with("bc1") { "Bitcoin" } else { "Bitcoin testnet" };
        let kind = match witness {
            'q' => "SegWit v0",
            'p' => "Taproot",
            _ => "SegWit",
        };
        Some(
            ClassificationResult::new(FormatType::CryptoAddress, 85, "Bitcoin Address")
                .with_field("Network", network)
                .with_field("Type", kind)
                .with_field("Encoding", "bech32"),
        )
    }

    fn base58(&self, token: &str) -> Option<ClassificationResult> {
        if !self.base58.is_match(token) {
            return None;
        }
        let bytes = base58_decode(token)?;
        if bytes.len() != 25 {
            return None;
        }
        let (payload, checksum) = bytes.split_at(21);
        let digest = Sha256::digest(Sha256::digest(payload));
        if &digest[..4] != checksum {
            return None;
        }
        let kind = match payload[0] {
            0x00 => "P2PKH",
            0x05 => "P2SH",
            _ => return None,
        };
        Some(
            ClassificationResult::new(FormatType::CryptoAddress, 75, "Bitcoin Address")
                .with_field("Network", "Bitcoin")
                .with_field("Type", kind)
                .with_field("Encoding", "base58check"),
        )
    }
}

impl Detector for CryptoAddressDetector {
    fn name(&self) -> &str {
        "crypto_address"
    }

    fn format(&self) -> FormatType {
        FormatType::CryptoAddress
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let token = single_token(content)?;
        if self.ethereum.is_match(token) {
            return Some(Self::ethereum(token));
        }
        self.bech32(token).or_else(|| self.base58(token))
    }
}
