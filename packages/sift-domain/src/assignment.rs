//! One-to-one matching of queries onto chunks.
//!
//! Matching is greedy over the full candidate list: pairs at or above the threshold are walked
//! from the highest score down, and a pair is accepted only while both its query and its chunk
//! are still free. Ties keep declaration order, so identical inputs always give identical maps.

use std::{
	cmp::Ordering,
	collections::{BTreeMap, HashMap, HashSet},
};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AssignmentError {
	#[error("Chunk index {index} is out of range for {chunk_count} chunks.")]
	ChunkOutOfRange { index: usize, chunk_count: usize },
	#[error("Query {0:?} is not part of this assignment map.")]
	UnknownQuery(String),
}

/// Query -> chunk index -> score, for a fixed number of chunks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkScores {
	chunk_count: usize,
	scores: BTreeMap<String, BTreeMap<usize, f32>>,
}
impl ChunkScores {
	pub fn new(chunk_count: usize) -> Self {
		Self { chunk_count, scores: BTreeMap::new() }
	}

	pub fn insert(
		&mut self,
		query: impl Into<String>,
		chunk_index: usize,
		score: f32,
	) -> Result<(), AssignmentError> {
		if chunk_index >= self.chunk_count {
			return Err(AssignmentError::ChunkOutOfRange {
				index: chunk_index,
				chunk_count: self.chunk_count,
			});
		}

		self.scores.entry(query.into()).or_default().insert(chunk_index, score);

		Ok(())
	}

	pub fn get(&self, query: &str, chunk_index: usize) -> Option<f32> {
		self.scores.get(query).and_then(|row| row.get(&chunk_index)).copied()
	}

	/// Highest-scoring chunk for `query`; the lowest index wins ties.
	pub fn best_chunk(&self, query: &str) -> Option<(usize, f32)> {
		let row = self.scores.get(query)?;
		let mut best: Option<(usize, f32)> = None;

		for (&chunk_index, &score) in row {
			if score.is_nan() {
				continue;
			}
			if best.is_none_or(|(_, current)| score > current) {
				best = Some((chunk_index, score));
			}
		}

		best
	}

	pub fn chunk_count(&self) -> usize {
		self.chunk_count
	}

	fn row(&self, query: &str) -> Option<&BTreeMap<usize, f32>> {
		self.scores.get(query)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryAssignment {
	pub query: String,
	pub assigned_chunk_index: usize,
	pub score: f32,
	/// The first declared query, the one the others were derived from.
	pub is_primary: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryAssignmentMap {
	/// Declared queries with duplicates collapsed.
	pub queries: Vec<String>,
	/// Assigned queries in declaration order.
	pub assignments: Vec<QueryAssignment>,
	/// One slot per chunk.
	pub chunk_assignments: Vec<Option<QueryAssignment>>,
	pub unassigned_queries: Vec<String>,
}
impl QueryAssignmentMap {
	fn from_slots(queries: Vec<String>, chunk_assignments: Vec<Option<QueryAssignment>>) -> Self {
		let by_query: HashMap<&str, &QueryAssignment> = chunk_assignments
			.iter()
			.flatten()
			.map(|assignment| (assignment.query.as_str(), assignment))
			.collect();
		let mut assignments = Vec::new();
		let mut unassigned_queries = Vec::new();

		for query in &queries {
			match by_query.get(query.as_str()).copied() {
				Some(assignment) => assignments.push(assignment.clone()),
				None => unassigned_queries.push(query.clone()),
			}
		}

		Self { queries, assignments, chunk_assignments, unassigned_queries }
	}

	pub fn primary_query(&self) -> Option<&str> {
		self.queries.first().map(String::as_str)
	}

	pub fn assignment_for(&self, query: &str) -> Option<&QueryAssignment> {
		self.assignments.iter().find(|assignment| assignment.query == query)
	}

	pub fn chunk_occupant(&self, chunk_index: usize) -> Option<&QueryAssignment> {
		self.chunk_assignments.get(chunk_index).and_then(Option::as_ref)
	}

	/// Both views agree and every query sits in exactly one of them.
	pub fn is_consistent(&self) -> bool {
		let slots_match = self.chunk_assignments.iter().enumerate().all(|(index, slot)| {
			slot.as_ref().is_none_or(|assignment| {
				assignment.assigned_chunk_index == index
					&& self.assignment_for(&assignment.query) == Some(assignment)
			})
		});
		let occupied = self.chunk_assignments.iter().flatten().count();
		let placed_once = self.queries.iter().all(|query| {
			let assigned = self.assignments.iter().filter(|a| &a.query == query).count();
			let unassigned = self.unassigned_queries.iter().filter(|q| *q == query).count();

			assigned + unassigned == 1
		});

		slots_match
			&& occupied == self.assignments.len()
			&& placed_once
			&& self.assignments.len() + self.unassigned_queries.len() == self.queries.len()
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reassignment {
	pub map: QueryAssignmentMap,
	pub evicted_query: Option<String>,
}

struct Candidate {
	query_index: usize,
	chunk_index: usize,
	score: f32,
}

pub fn compute_query_assignments(
	chunk_scores: &ChunkScores,
	queries: &[String],
	min_score_threshold: f32,
) -> QueryAssignmentMap {
	let queries = declared_queries(queries);
	let chunk_count = chunk_scores.chunk_count();
	let mut candidates = Vec::new();

	for (query_index, query) in queries.iter().enumerate() {
		let Some(row) = chunk_scores.row(query) else { continue };

		for (&chunk_index, &score) in row {
			// NaN fails the comparison and never qualifies.
			if chunk_index < chunk_count && score >= min_score_threshold {
				candidates.push(Candidate { query_index, chunk_index, score });
			}
		}
	}

	candidates.sort_by(|lhs, rhs| rhs.score.partial_cmp(&lhs.score).unwrap_or(Ordering::Equal));

	let mut query_taken = vec![false; queries.len()];
	let mut chunk_assignments: Vec<Option<QueryAssignment>> = vec![None; chunk_count];

	for candidate in candidates {
		if query_taken[candidate.query_index] || chunk_assignments[candidate.chunk_index].is_some()
		{
			continue;
		}

		query_taken[candidate.query_index] = true;
		chunk_assignments[candidate.chunk_index] = Some(QueryAssignment {
			query: queries[candidate.query_index].clone(),
			assigned_chunk_index: candidate.chunk_index,
			score: candidate.score,
			is_primary: candidate.query_index == 0,
		});
	}

	QueryAssignmentMap::from_slots(queries, chunk_assignments)
}

/// Moves `query` onto `new_chunk_index`, evicting whichever other query held that chunk.
///
/// Manual moves are not checked against the assignment threshold. A pair missing from
/// `chunk_scores` is recorded with a score of zero.
pub fn reassign_query(
	map: &QueryAssignmentMap,
	query: &str,
	new_chunk_index: usize,
	chunk_scores: &ChunkScores,
) -> Result<Reassignment, AssignmentError> {
	let chunk_count = map.chunk_assignments.len();

	if new_chunk_index >= chunk_count {
		return Err(AssignmentError::ChunkOutOfRange { index: new_chunk_index, chunk_count });
	}
	if !map.queries.iter().any(|declared| declared == query) {
		return Err(AssignmentError::UnknownQuery(query.to_string()));
	}

	let mut slots = map.chunk_assignments.clone();

	for slot in slots.iter_mut() {
		if slot.as_ref().is_some_and(|assignment| assignment.query == query) {
			*slot = None;
		}
	}

	let evicted_query = slots[new_chunk_index].take().map(|assignment| assignment.query);

	slots[new_chunk_index] = Some(QueryAssignment {
		query: query.to_string(),
		assigned_chunk_index: new_chunk_index,
		score: chunk_scores.get(query, new_chunk_index).unwrap_or(0.0),
		is_primary: map.primary_query() == Some(query),
	});

	Ok(Reassignment {
		map: QueryAssignmentMap::from_slots(map.queries.clone(), slots),
		evicted_query,
	})
}

fn declared_queries(queries: &[String]) -> Vec<String> {
	let mut seen = HashSet::with_capacity(queries.len());

	queries.iter().filter(|query| seen.insert(query.as_str())).cloned().collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn duplicates_collapse_to_first_occurrence() {
		let queries = ["a", "b", "a"].map(String::from);

		assert_eq!(declared_queries(&queries), vec!["a".to_string(), "b".to_string()]);
	}

	#[test]
	fn best_chunk_skips_nan_and_prefers_lower_index() {
		let mut scores = ChunkScores::new(3);

		scores.insert("q", 0, f32::NAN).unwrap();
		scores.insert("q", 1, 0.7).unwrap();
		scores.insert("q", 2, 0.7).unwrap();

		assert_eq!(scores.best_chunk("q"), Some((1, 0.7)));
		assert_eq!(scores.best_chunk("missing"), None);
	}

	#[test]
	fn insert_rejects_out_of_range_chunks() {
		let mut scores = ChunkScores::new(1);

		assert_eq!(
			scores.insert("q", 1, 0.5),
			Err(AssignmentError::ChunkOutOfRange { index: 1, chunk_count: 1 })
		);
	}
}
