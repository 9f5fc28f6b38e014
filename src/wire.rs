use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Bound on acceptance/rejection tokens.
pub const MAX_RESPONSE_LEN: u64 = 128;
/// Bound on a host's signed settings object.
pub const MAX_SETTINGS_LEN: u64 = 16 * 1024;
/// Bound on a transaction set, the ledger's block size limit.
pub const MAX_TXN_SET_LEN: u64 = 2 * 1024 * 1024;
// Room for the signature and framing around a signed payload.
const SIGNED_FRAME_OVERHEAD: u64 = 256;

/// The shared "proceed" token. Any other string on the wire is a literal
/// rejection reason.
pub const ACCEPT_RESPONSE: &str = "accept";

/// 8-byte operation tag announced at the start of a connection, written
/// raw with no length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcId(pub [u8; 8]);

pub const RPC_FORM_CONTRACT: RpcId = RpcId(*b"FormCtrt");

impl fmt::Display for RpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("connection i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: u64, max: u64 },
    #[error("failed to encode object: {0}")]
    Encode(String),
    #[error("failed to decode object: {0}")]
    Decode(String),
    #[error("signature verification failed")]
    BadSignature,
}

pub async fn write_rpc_id<W>(conn: &mut W, id: RpcId) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    conn.write_all(&id.0).await?;
    conn.flush().await?;
    Ok(())
}

pub async fn read_rpc_id<R>(conn: &mut R) -> Result<RpcId, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 8];
    conn.read_exact(&mut buf).await?;
    Ok(RpcId(buf))
}

/// Write one length-prefixed CBOR frame: an 8-byte little-endian length
/// followed by the encoded object.
pub async fn write_object<W, T>(conn: &mut W, value: &T) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let mut payload = Vec::new();
    ciborium::into_writer(value, &mut payload).map_err(|e| WireError::Encode(e.to_string()))?;
    conn.write_all(&(payload.len() as u64).to_le_bytes()).await?;
    conn.write_all(&payload).await?;
    conn.flush().await?;
    Ok(())
}

/// Read one length-prefixed CBOR frame. An announced length above
/// `max_len` is rejected before any body byte is read.
pub async fn read_object<R, T>(conn: &mut R, max_len: u64) -> Result<T, WireError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 8];
    conn.read_exact(&mut len_buf).await?;
    let len = u64::from_le_bytes(len_buf);
    if len > max_len {
        return Err(WireError::FrameTooLarge { len, max: max_len });
    }
    let mut payload = vec![0u8; len as usize];
    conn.read_exact(&mut payload).await?;
    ciborium::from_reader(payload.as_slice()).map_err(|e| WireError::Decode(e.to_string()))
}

#[derive(Serialize, Deserialize)]
struct SignedFrame {
    payload: Vec<u8>,
    signature: Vec<u8>,
}

/// Encode `value`, sign the encoding, and write the signed frame.
pub async fn write_signed_object<W, T>(
    conn: &mut W,
    value: &T,
    key: &SigningKey,
) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut payload = Vec::new();
    ciborium::into_writer(value, &mut payload).map_err(|e| WireError::Encode(e.to_string()))?;
    let signature = key.sign(&payload).to_bytes().to_vec();
    write_object(conn, &SignedFrame { payload, signature }).await
}

/// Read a signed frame, verify the signature against `key`, and only then
/// decode the payload.
pub async fn read_signed_object<R, T>(
    conn: &mut R,
    max_len: u64,
    key: &VerifyingKey,
) -> Result<T, WireError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let frame: SignedFrame = read_object(conn, max_len + SIGNED_FRAME_OVERHEAD).await?;
    let signature =
        Signature::from_slice(&frame.signature).map_err(|_| WireError::BadSignature)?;
    key.verify(&frame.payload, &signature)
        .map_err(|_| WireError::BadSignature)?;
    ciborium::from_reader(frame.payload.as_slice()).map_err(|e| WireError::Decode(e.to_string()))
}
