//! Numeric primitives over embedding vectors.
//!
//! Distances are unbounded and only meaningful when compared across chunks for a fixed query.
//! Inputs of different lengths are compared over their common prefix, except for cosine which
//! treats a length mismatch as no similarity.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScores {
	pub cosine: f32,
	pub euclidean: f32,
	pub manhattan: f32,
	pub dot_product: f32,
	pub chamfer: f32,
}
impl SimilarityScores {
	/// Single-vector comparison; chamfer degenerates to the (floored) cosine.
	pub fn between(lhs: &[f32], rhs: &[f32]) -> Self {
		let cosine = cosine(lhs, rhs);

		Self {
			cosine,
			euclidean: euclidean(lhs, rhs),
			manhattan: manhattan(lhs, rhs),
			dot_product: dot_product(lhs, rhs),
			chamfer: cosine.max(0.0),
		}
	}

	/// Aggregate vectors for the point metrics, decomposed sets for chamfer.
	pub fn with_chamfer<L, R>(lhs: &[f32], rhs: &[f32], lhs_set: &[L], rhs_set: &[R]) -> Self
	where
		L: AsRef<[f32]>,
		R: AsRef<[f32]>,
	{
		Self { chamfer: chamfer(lhs_set, rhs_set), ..Self::between(lhs, rhs) }
	}
}

pub fn dot_product(lhs: &[f32], rhs: &[f32]) -> f32 {
	lhs.iter().zip(rhs.iter()).map(|(l, r)| l * r).sum()
}

pub fn norm(vector: &[f32]) -> f32 {
	vector.iter().map(|value| value * value).sum::<f32>().sqrt()
}

/// Zero when either side is empty, zero-norm or of a different length.
pub fn cosine(lhs: &[f32], rhs: &[f32]) -> f32 {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return 0.0;
	}

	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
		return 0.0;
	}

	let value = dot / (lhs_norm.sqrt() * rhs_norm.sqrt());

	if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) }
}

pub fn euclidean(lhs: &[f32], rhs: &[f32]) -> f32 {
	lhs.iter().zip(rhs.iter()).map(|(l, r)| (l - r) * (l - r)).sum::<f32>().sqrt()
}

pub fn manhattan(lhs: &[f32], rhs: &[f32]) -> f32 {
	lhs.iter().zip(rhs.iter()).map(|(l, r)| (l - r).abs()).sum()
}

/// Bidirectional best-match coverage between two vector sets, in `[0, 1]`.
///
/// Each vector in one set is matched to its most similar vector in the other (negative
/// similarities count as zero); the two directional means are averaged. Either set empty
/// yields zero.
pub fn chamfer<L, R>(lhs: &[L], rhs: &[R]) -> f32
where
	L: AsRef<[f32]>,
	R: AsRef<[f32]>,
{
	if lhs.is_empty() || rhs.is_empty() {
		return 0.0;
	}

	(directional_coverage(lhs, rhs) + directional_coverage(rhs, lhs)) / 2.0
}

fn directional_coverage<L, R>(from: &[L], to: &[R]) -> f32
where
	L: AsRef<[f32]>,
	R: AsRef<[f32]>,
{
	let total: f32 = from
		.iter()
		.map(|source| {
			to.iter()
				.map(|target| cosine(source.as_ref(), target.as_ref()).max(0.0))
				.fold(0.0_f32, f32::max)
		})
		.sum();

	total / from.len() as f32
}
