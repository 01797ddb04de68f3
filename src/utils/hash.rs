const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over the UTF-16 code units of `input`.
///
/// Hashing code units rather than bytes keeps the seed identical to the one the
/// browser client derives with `charCodeAt`, so assignments computed here and in
/// the exam page agree bit for bit.
pub fn fnv1a_32(input: &str) -> u32 {
    input.encode_utf16().fold(FNV_OFFSET_BASIS, |hash, unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

/// Seed key for a student's attempt at a paper.
pub fn assignment_key(student_id: &str, paper_id: &str) -> String {
    format!("{}::{}", student_id, paper_id)
}
