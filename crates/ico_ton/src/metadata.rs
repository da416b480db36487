//! TEP-64 on-chain token metadata.

use async_trait::async_trait;
use everscale_types::error::Error;
use everscale_types::prelude::*;
use sha2::{Digest, Sha256};

use crate::codec::store;
use crate::error::DeployError;

pub use ico_core::TokenMetadata;

const ONCHAIN_CONTENT_PREFIX: u8 = 0x00;
const SNAKE_PREFIX: u8 = 0x00;

/// Bytes of payload per snake cell: (1023 - 8) / 8.
pub const SNAKE_CHUNK_BYTES: usize = 126;

/// `HashmapE 256 ^Cell` keyed by `sha256(field name)`.
pub type ContentDict = Dict<HashBytes, Cell>;

/// Turns token metadata into the opaque content cell stored in contract data.
#[async_trait]
pub trait MetadataEncoder: Send + Sync {
    async fn build_onchain_metadata(&self, metadata: &TokenMetadata) -> Result<Cell, DeployError>;
}

/// Encodes every field on chain; no off-chain URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnchainMetadataEncoder;

#[async_trait]
impl MetadataEncoder for OnchainMetadataEncoder {
    async fn build_onchain_metadata(&self, metadata: &TokenMetadata) -> Result<Cell, DeployError> {
        encode_onchain_metadata(metadata)
    }
}

fn fields(metadata: &TokenMetadata) -> [(&'static str, &str); 4] {
    [
        ("name", metadata.name.as_str()),
        ("description", metadata.description.as_str()),
        ("symbol", metadata.symbol.as_str()),
        ("image", metadata.image.as_str()),
    ]
}

/// Dictionary key for a metadata field.
pub fn field_key(name: &str) -> HashBytes {
    HashBytes(Sha256::digest(name.as_bytes()).into())
}

pub fn encode_onchain_metadata(metadata: &TokenMetadata) -> Result<Cell, DeployError> {
    content_cell(metadata).map_err(DeployError::encoding)
}

fn content_cell(metadata: &TokenMetadata) -> Result<Cell, Error> {
    let mut dict = ContentDict::new();
    for (name, value) in fields(metadata) {
        dict.set(field_key(name), snake_cell(value.as_bytes())?)?;
    }
    let mut b = CellBuilder::new();
    b.store_u8(ONCHAIN_CONTENT_PREFIX)?;
    store(&mut b, &dict)?;
    b.build()
}

pub fn decode_onchain_metadata(content: &DynCell) -> Result<TokenMetadata, DeployError> {
    let mut s = content.as_slice().map_err(DeployError::encoding)?;
    let prefix = s.load_u8().map_err(DeployError::encoding)?;
    if prefix != ONCHAIN_CONTENT_PREFIX {
        return Err(DeployError::Encoding(format!(
            "expected on-chain content prefix, found {prefix:#04x}"
        )));
    }
    let dict = ContentDict::load_from(&mut s).map_err(DeployError::encoding)?;

    let field = |name: &str| -> Result<String, DeployError> {
        let Some(cell) = dict.get(field_key(name)).map_err(DeployError::encoding)? else {
            return Ok(String::new());
        };
        let bytes = read_snake(cell.as_ref()).map_err(DeployError::encoding)?;
        String::from_utf8(bytes)
            .map_err(|e| DeployError::Encoding(format!("{name} is not UTF-8: {e}")))
    };

    Ok(TokenMetadata {
        name: field("name")?,
        description: field("description")?,
        symbol: field("symbol")?,
        image: field("image")?,
    })
}

/// Snake-encode `data`: a prefix byte then 126-byte chunks, each continuing
/// in the next cell's only reference. Empty data gives an empty cell.
pub fn snake_cell(data: &[u8]) -> Result<Cell, Error> {
    let mut next: Option<Cell> = None;
    let chunks: Vec<&[u8]> = data.chunks(SNAKE_CHUNK_BYTES).collect();
    for (i, chunk) in chunks.iter().enumerate().rev() {
        let mut b = CellBuilder::new();
        if i == 0 {
            b.store_u8(SNAKE_PREFIX)?;
        }
        b.store_raw(chunk, (chunk.len() * 8) as u16)?;
        if let Some(tail) = next.take() {
            b.store_reference(tail)?;
        }
        next = Some(b.build()?);
    }
    Ok(next.unwrap_or_else(Cell::empty_cell))
}

/// Read the bytes of a snake cell written by [`snake_cell`].
pub fn read_snake(cell: &DynCell) -> Result<Vec<u8>, Error> {
    if cell.bit_len() == 0 && cell.reference_count() == 0 {
        return Ok(Vec::new());
    }
    let mut s = cell.as_slice()?;
    if s.load_u8()? != SNAKE_PREFIX {
        return Err(Error::InvalidTag);
    }

    let mut out = Vec::new();
    loop {
        let bits = s.size_bits();
        if bits % 8 != 0 {
            return Err(Error::InvalidData);
        }
        let mut chunk = vec![0u8; usize::from(bits / 8)];
        s.load_raw(&mut chunk, bits)?;
        out.extend_from_slice(&chunk);
        if s.size_refs() == 0 {
            break;
        }
        s = s.load_reference()?.as_slice()?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_value_fits_one_cell() {
        let cell = snake_cell(b"XXX").unwrap();
        assert_eq!(cell.bit_len(), 8 + 24);
        assert_eq!(cell.reference_count(), 0);
        assert_eq!(read_snake(cell.as_ref()).unwrap(), b"XXX");
    }

    #[test]
    fn empty_value_is_empty_cell() {
        let cell = snake_cell(b"").unwrap();
        assert_eq!(cell, Cell::empty_cell());
        assert!(read_snake(cell.as_ref()).unwrap().is_empty());
    }

    #[test]
    fn long_value_chains_cells() {
        let data: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
        let cell = snake_cell(&data).unwrap();
        assert_eq!(usize::from(cell.bit_len()), 8 + SNAKE_CHUNK_BYTES * 8);
        let second = cell.reference(0).unwrap();
        assert_eq!(usize::from(second.bit_len()), SNAKE_CHUNK_BYTES * 8);
        let third = second.reference(0).unwrap();
        assert_eq!(usize::from(third.bit_len()), (300 - 2 * SNAKE_CHUNK_BYTES) * 8);
        assert_eq!(third.reference_count(), 0);
        assert_eq!(read_snake(cell.as_ref()).unwrap(), data);
    }

    #[test]
    fn chunk_boundary_does_not_add_empty_cell() {
        let data = vec![b'a'; SNAKE_CHUNK_BYTES];
        let cell = snake_cell(&data).unwrap();
        assert_eq!(cell.reference_count(), 0);
    }

    #[test]
    fn field_keys_are_sha256_of_names() {
        assert_eq!(
            field_key("name").to_string(),
            "82a3537ff0dbce7eec35d69edc3a189ee6f17d82f353a553f9aa96cb0be3ce89"
        );
    }

    #[test]
    fn content_round_trip() {
        let metadata = TokenMetadata::default();
        let content = encode_onchain_metadata(&metadata).unwrap();
        let mut s = content.as_slice().unwrap();
        assert_eq!(s.load_u8().unwrap(), 0x00);
        assert!(s.load_bit().unwrap());
        assert_eq!(decode_onchain_metadata(content.as_ref()).unwrap(), metadata);
    }

    #[test]
    fn dictionary_holds_one_entry_per_field() {
        let content = encode_onchain_metadata(&TokenMetadata::default()).unwrap();
        let mut s = content.as_slice().unwrap();
        s.load_u8().unwrap();
        let dict = ContentDict::load_from(&mut s).unwrap();
        let keys: Vec<HashBytes> = dict.keys().map(|k| k.unwrap()).collect();
        assert_eq!(keys.len(), 4);
        for name in ["name", "description", "symbol", "image"] {
            assert!(keys.contains(&field_key(name)), "{name}");
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let metadata = TokenMetadata::default();
        assert_eq!(
            encode_onchain_metadata(&metadata).unwrap().repr_hash(),
            encode_onchain_metadata(&metadata.clone()).unwrap().repr_hash()
        );
    }

    #[test]
    fn unicode_survives() {
        let metadata = TokenMetadata {
            name: "Токен ✓".into(),
            description: "x".repeat(400),
            symbol: String::new(),
            image: "ipfs://cid".into(),
        };
        let content = encode_onchain_metadata(&metadata).unwrap();
        assert_eq!(decode_onchain_metadata(content.as_ref()).unwrap(), metadata);
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        let mut b = CellBuilder::new();
        b.store_u8(0x01).unwrap();
        let cell = b.build().unwrap();
        assert!(matches!(
            decode_onchain_metadata(cell.as_ref()),
            Err(DeployError::Encoding(_))
        ));
    }

    #[test]
    fn unaligned_snake_is_rejected() {
        let mut b = CellBuilder::new();
        b.store_u8(SNAKE_PREFIX).unwrap();
        b.store_small_uint(0b101, 3).unwrap();
        let cell = b.build().unwrap();
        assert!(read_snake(cell.as_ref()).is_err());
    }

    #[tokio::test]
    async fn encoder_trait_matches_free_function() {
        let metadata = TokenMetadata::default();
        let via_trait = OnchainMetadataEncoder
            .build_onchain_metadata(&metadata)
            .await
            .unwrap();
        assert_eq!(via_trait, encode_onchain_metadata(&metadata).unwrap());
    }
}
