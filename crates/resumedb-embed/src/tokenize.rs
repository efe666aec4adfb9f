use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use resumedb_core::{Error, Result};

/// Tokenize a batch, truncate to `max_len` and right-pad to the longest
/// sequence. Returns `(input_ids, attention_mask)`, both `[B, T]` u32.
pub fn tokenize_batch(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_len: usize,
    pad_id: u32,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| Error::ExternalService(format!("Tokenization failed: {}", e)))?;
    let mut rows: Vec<(Vec<u32>, Vec<u32>)> = encodings
        .iter()
        .map(|enc| {
            let mut ids = enc.get_ids().to_vec();
            let mut mask = enc.get_attention_mask().to_vec();
            ids.truncate(max_len);
            mask.truncate(max_len);
            (ids, mask)
        })
        .collect();
    let width = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);
    for (ids, mask) in &mut rows {
        let pad = width - ids.len();
        ids.extend(std::iter::repeat(pad_id).take(pad));
        mask.extend(std::iter::repeat(0).take(pad));
    }
    let batch = rows.len();
    let (ids, mask): (Vec<Vec<u32>>, Vec<Vec<u32>>) = rows.into_iter().unzip();
    let input_ids =
        Tensor::from_vec(ids.concat(), (batch, width), device).map_err(crate::model_err)?;
    let attention_mask =
        Tensor::from_vec(mask.concat(), (batch, width), device).map_err(crate::model_err)?;
    Ok((input_ids, attention_mask))
}
