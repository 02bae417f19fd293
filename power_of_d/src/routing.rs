//! Power-of-d choices routing.
//!
//! A job samples `d` of the `n` queues uniformly without replacement and joins
//! the shortest of them. With `d == n` this is join-the-shortest-queue; with
//! `d == 1` it is uniform random assignment.

use des::DesError;
use rand::Rng;
use rand::seq::index;

use crate::config::ConfigError;
use crate::resource::ResourceQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingPolicy {
    d: usize,
    n: usize,
}

impl RoutingPolicy {
    pub fn new(d: usize, n: usize) -> Result<RoutingPolicy, ConfigError> {
        if d == 0 || d > n {
            return Err(ConfigError::new("d", format!("sample size {d} outside [1, {n}]")));
        }
        Ok(RoutingPolicy { d, n })
    }

    pub fn d(&self) -> usize {
        self.d
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// `d` distinct queue indices, in the order they were drawn.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        index::sample(rng, self.n, self.d).into_vec()
    }

    /// Pick the queue for one job.
    ///
    /// Ties on length go to whichever tied queue was drawn first, never to the
    /// lower queue id. Only reads the queues.
    pub fn select<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        queues: &[ResourceQueue],
    ) -> Result<usize, DesError> {
        if queues.len() != self.n {
            return Err(DesError::InvariantViolation(format!(
                "routing over {} queues, policy built for {}",
                queues.len(),
                self.n
            )));
        }
        let sampled = self.sample(rng);
        Ok(shortest_first_drawn(&sampled, |i| queues[i].length()))
    }
}

fn shortest_first_drawn(sampled: &[usize], length: impl Fn(usize) -> usize) -> usize {
    let mut best = sampled[0];
    let mut best_length = length(best);
    for &candidate in &sampled[1..] {
        let candidate_length = length(candidate);
        // strict: an equal length never displaces an earlier draw
        if candidate_length < best_length {
            best = candidate;
            best_length = candidate_length;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn queues_with_lengths(lengths: &[usize]) -> Vec<ResourceQueue> {
        let mut job = 0;
        lengths
            .iter()
            .enumerate()
            .map(|(id, &len)| {
                let mut queue = ResourceQueue::new(id, 1);
                for _ in 0..len {
                    queue.acquire(job, 0.0);
                    job += 1;
                }
                queue
            })
            .collect()
    }

    #[test]
    fn rejects_bad_sample_size() {
        assert!(RoutingPolicy::new(0, 3).is_err());
        assert!(RoutingPolicy::new(4, 3).is_err());
        assert!(RoutingPolicy::new(3, 3).is_ok());
    }

    #[test]
    fn sample_is_distinct_and_in_range() {
        let policy = RoutingPolicy::new(5, 8).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let mut sampled = policy.sample(&mut rng);
            assert_eq!(sampled.len(), 5);
            assert!(sampled.iter().all(|&i| i < 8));
            sampled.sort_unstable();
            sampled.dedup();
            assert_eq!(sampled.len(), 5);
        }
    }

    #[test]
    fn tie_goes_to_first_drawn() {
        assert_eq!(shortest_first_drawn(&[2, 0, 1], |_| 1), 2);
        assert_eq!(shortest_first_drawn(&[2, 0, 1], |i| [0, 5, 0][i]), 2);
        assert_eq!(shortest_first_drawn(&[1, 0, 2], |i| [3, 2, 2][i]), 1);
    }

    #[test]
    fn full_sample_is_join_the_shortest_queue() {
        let queues = queues_with_lengths(&[4, 2, 7, 1, 3]);
        let policy = RoutingPolicy::new(5, 5).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            assert_eq!(policy.select(&mut rng, &queues).unwrap(), 3);
        }
    }

    #[test]
    fn select_picks_shortest_of_sample() {
        let queues = queues_with_lengths(&[4, 2, 7, 1, 3, 0, 6]);
        let policy = RoutingPolicy::new(3, 7).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut replay = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let chosen = policy.select(&mut rng, &queues).unwrap();
            let sampled = policy.sample(&mut replay);
            let min = sampled.iter().map(|&i| queues[i].length()).min().unwrap();
            assert!(sampled.contains(&chosen));
            assert_eq!(queues[chosen].length(), min);
        }
    }

    #[test]
    fn select_does_not_mutate_queues() {
        let queues = queues_with_lengths(&[2, 1, 3]);
        let before: Vec<usize> = queues.iter().map(|q| q.length()).collect();
        let policy = RoutingPolicy::new(2, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..10 {
            policy.select(&mut rng, &queues).unwrap();
        }
        let after: Vec<usize> = queues.iter().map(|q| q.length()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn wrong_queue_count_is_an_invariant_violation() {
        let queues = queues_with_lengths(&[0, 0]);
        let policy = RoutingPolicy::new(1, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(policy.select(&mut rng, &queues).is_err());
    }
}
