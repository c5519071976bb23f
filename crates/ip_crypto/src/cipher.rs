//! AES-256-CBC block transforms
//!
//! The symmetric cipher behind content sealing, exposed as incremental
//! `BlockTransform`s so either direction can sit inside an
//! `AuthenticatedTransform`. PKCS#7 padding on the final block.

use aes::cipher::{
    block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut, KeyIvInit,
};

use crate::transform::{BlockTransform, TransformError};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

fn check_aligned(len: usize) -> Result<(), TransformError> {
    if len % BLOCK_SIZE != 0 {
        return Err(TransformError::BlockSize { expected: BLOCK_SIZE, got: len });
    }
    Ok(())
}

// ── Encryptor ────────────────────────────────────────────────────────────────

/// CBC encryptor. The final block is PKCS#7-padded, so ciphertext for an
/// aligned plaintext is one block longer than the input.
pub struct CbcEncryptor {
    inner: Option<Aes256CbcEnc>,
}

impl CbcEncryptor {
    pub fn new(key: &[u8; 32], iv: &[u8; 16]) -> Self {
        Self { inner: Some(Aes256CbcEnc::new(key.into(), iv.into())) }
    }
}

impl BlockTransform for CbcEncryptor {
    fn input_block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn output_block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn transforms_many_blocks(&self) -> bool {
        true
    }

    fn process_block(&mut self, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let enc = self.inner.as_mut().ok_or(TransformError::AlreadyFinalised)?;
        check_aligned(input.len())?;
        let mut out = input.to_vec();
        for block in out.chunks_exact_mut(BLOCK_SIZE) {
            enc.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        Ok(out)
    }

    fn process_final_block(&mut self, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        // encrypt_padded_mut consumes the cipher state; taking it also makes
        // any later call fail with AlreadyFinalised.
        let enc = self.inner.take().ok_or(TransformError::AlreadyFinalised)?;
        let mut buf = vec![0u8; input.len() + BLOCK_SIZE];
        buf[..input.len()].copy_from_slice(input);
        let n = enc
            .encrypt_padded_mut::<Pkcs7>(&mut buf, input.len())
            .map_err(|_| TransformError::Padding)?
            .len();
        buf.truncate(n);
        Ok(buf)
    }
}

// ── Decryptor ────────────────────────────────────────────────────────────────

/// CBC decryptor. Holds back one ciphertext block between calls so the
/// PKCS#7 padding block is always stripped in `process_final_block`, no
/// matter how the caller chunks the input.
pub struct CbcDecryptor {
    inner: Option<Aes256CbcDec>,
    held: Vec<u8>,
}

impl CbcDecryptor {
    pub fn new(key: &[u8; 32], iv: &[u8; 16]) -> Self {
        Self { inner: Some(Aes256CbcDec::new(key.into(), iv.into())), held: Vec::new() }
    }
}

impl BlockTransform for CbcDecryptor {
    fn input_block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn output_block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn transforms_many_blocks(&self) -> bool {
        true
    }

    fn process_block(&mut self, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let dec = self.inner.as_mut().ok_or(TransformError::AlreadyFinalised)?;
        check_aligned(input.len())?;
        let mut pending = std::mem::take(&mut self.held);
        pending.extend_from_slice(input);
        if pending.len() <= BLOCK_SIZE {
            self.held = pending;
            return Ok(Vec::new());
        }
        let keep_from = pending.len() - BLOCK_SIZE;
        self.held = pending.split_off(keep_from);
        for block in pending.chunks_exact_mut(BLOCK_SIZE) {
            dec.decrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        Ok(pending)
    }

    fn process_final_block(&mut self, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let dec = self.inner.take().ok_or(TransformError::AlreadyFinalised)?;
        let mut buf = std::mem::take(&mut self.held);
        buf.extend_from_slice(input);
        if buf.is_empty() || buf.len() % BLOCK_SIZE != 0 {
            return Err(TransformError::BlockSize { expected: BLOCK_SIZE, got: buf.len() });
        }
        let n = dec
            .decrypt_padded_mut::<Pkcs7>(&mut buf)
            .map_err(|_| TransformError::Padding)?
            .len();
        buf.truncate(n);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x42; 32];
    const IV: [u8; 16] = [0x24; 16];

    fn encrypt_whole(plaintext: &[u8]) -> Vec<u8> {
        let mut enc = CbcEncryptor::new(&KEY, &IV);
        let aligned = plaintext.len() / BLOCK_SIZE * BLOCK_SIZE;
        let mut out = enc.process_block(&plaintext[..aligned]).unwrap();
        out.extend_from_slice(&enc.process_final_block(&plaintext[aligned..]).unwrap());
        out
    }

    fn decrypt_in_chunks(ciphertext: &[u8], chunk: usize) -> Result<Vec<u8>, TransformError> {
        let mut dec = CbcDecryptor::new(&KEY, &IV);
        let aligned = ciphertext.len() / chunk * chunk;
        let mut out = Vec::new();
        for piece in ciphertext[..aligned].chunks(chunk) {
            out.extend_from_slice(&dec.process_block(piece)?);
        }
        out.extend_from_slice(&dec.process_final_block(&ciphertext[aligned..])?);
        Ok(out)
    }

    #[test]
    fn round_trip_various_lengths() {
        for len in [0usize, 1, 15, 16, 17, 31, 32, 1000, 65536 + 5] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let ciphertext = encrypt_whole(&plaintext);
            assert_eq!(ciphertext.len(), (len / BLOCK_SIZE + 1) * BLOCK_SIZE);
            for chunk in [16usize, 32, 48, 65536] {
                assert_eq!(decrypt_in_chunks(&ciphertext, chunk).unwrap(), plaintext, "len {len} chunk {chunk}");
            }
        }
    }

    #[test]
    fn decryptor_defers_one_block_for_padding() {
        let ciphertext = encrypt_whole(b"short");
        assert_eq!(ciphertext.len(), BLOCK_SIZE);
        let mut dec = CbcDecryptor::new(&KEY, &IV);
        assert!(dec.process_block(&ciphertext).unwrap().is_empty());
        assert_eq!(dec.process_final_block(&[]).unwrap(), b"short");
    }

    #[test]
    fn misaligned_block_input_rejected() {
        let mut enc = CbcEncryptor::new(&KEY, &IV);
        let err = enc.process_block(&[0u8; 10]).unwrap_err();
        assert_eq!(err, TransformError::BlockSize { expected: BLOCK_SIZE, got: 10 });

        let mut dec = CbcDecryptor::new(&KEY, &IV);
        let err = dec.process_block(&[0u8; 17]).unwrap_err();
        assert_eq!(err, TransformError::BlockSize { expected: BLOCK_SIZE, got: 17 });
    }

    #[test]
    fn misaligned_or_empty_ciphertext_rejected_at_final() {
        let mut dec = CbcDecryptor::new(&KEY, &IV);
        let err = dec.process_final_block(&[]).unwrap_err();
        assert_eq!(err, TransformError::BlockSize { expected: BLOCK_SIZE, got: 0 });
    }

    #[test]
    fn use_after_final_is_rejected() {
        let mut enc = CbcEncryptor::new(&KEY, &IV);
        enc.process_final_block(b"tail").unwrap();
        assert_eq!(enc.process_block(&[0u8; 16]).unwrap_err(), TransformError::AlreadyFinalised);
        assert_eq!(enc.process_final_block(b"").unwrap_err(), TransformError::AlreadyFinalised);
    }

    #[test]
    fn truncated_ciphertext_fails_padding_check() {
        // Two blocks of 'A' encrypt to three; keeping only the first block
        // leaves a final "padding" byte of 0x41, which is invalid.
        let ciphertext = encrypt_whole(&[0x41; 32]);
        let mut dec = CbcDecryptor::new(&KEY, &IV);
        let err = dec.process_final_block(&ciphertext[..BLOCK_SIZE]).unwrap_err();
        assert_eq!(err, TransformError::Padding);
    }
}
