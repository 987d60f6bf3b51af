use super::DEFAULT_SEED;
use crate::{Fitness, Grid, LayoutSearch};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Generational genetic search over clones of the prepared grid
///
/// Every generation keeps its elite, mutates a slice of the shuffled upper
/// half and fills the rest with crossovers of pairs from that half. Scoring
/// of a generation runs on a rayon pool and is joined before the next
/// generation is bred, so generations are strictly sequential.
#[derive(Debug, Clone)]
pub struct GeneticSearch {
    /// Number of individuals kept per generation
    pub generation_size: usize,

    /// Maximum number of generations, the seed generation included
    pub generation_count: usize,

    /// Share of the fittest individuals copied unchanged, in percent
    pub elitism_percent: usize,

    /// Share of the generation produced by mutation, in percent
    pub mutation_percent: usize,

    /// Seed individuals spawned per edge before the first selection
    pub seed_factor: usize,

    /// Stop once this much wall-clock time has passed between generations
    pub time_budget: Option<Duration>,

    /// Stop once the fittest individual is at least this good
    pub fitness_threshold: Option<Fitness>,

    /// Size of the worker pool, `None` for rayon's default
    pub threads: Option<usize>,

    /// Seed of the driving random generator
    pub seed: u64,
}

impl Default for GeneticSearch {
    fn default() -> Self {
        Self {
            generation_size: 250,
            generation_count: 1000,
            elitism_percent: 1,
            mutation_percent: 50,
            seed_factor: 100,
            time_budget: None,
            fitness_threshold: None,
            threads: None,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone)]
struct Individual {
    grid: Grid,
    fitness: Fitness,
}

impl Individual {
    fn new(grid: Grid) -> Self {
        let fitness = grid.fitness();
        Self { grid, fitness }
    }
}

/// One independent unit of work for the pool
///
/// Each task owns its seed so the outcome does not depend on which worker
/// runs it.
enum Task<'a> {
    Mutate { parent: &'a Grid, seed: u64 },
    Crossover { a: &'a Grid, b: &'a Grid, seed: u64 },
}

impl Task<'_> {
    fn run(self) -> Individual {
        match self {
            Task::Mutate { parent, seed } => Individual::new(mutant(parent, seed)),
            Task::Crossover { a, b, seed } => match a.crossover(b) {
                Some(child) => Individual::new(child),
                // Corridors collided, fall back to a mutant of the first parent
                None => Individual::new(mutant(a, seed)),
            },
        }
    }
}

fn mutant(parent: &Grid, seed: u64) -> Grid {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut grid = parent.clone();
    grid.mutate(&mut rng);
    grid
}

impl GeneticSearch {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    fn pool(&self) -> Option<ThreadPool> {
        let threads = self.threads?;
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .inspect_err(|e| warn!("Falling back to the global pool: {e}"))
            .ok()
    }

    /// Run all tasks of a generation and wait for every one of them
    fn evaluate(&self, pool: Option<&ThreadPool>, tasks: Vec<Task<'_>>) -> Vec<Individual> {
        let run = move || tasks.into_par_iter().map(Task::run).collect::<Vec<_>>();
        match pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    fn elite_count(&self) -> usize {
        (self.generation_size * self.elitism_percent / 100).max(1)
    }

    fn seed_generation<R>(
        &self,
        grid: &Grid,
        rng: &mut R,
        pool: Option<&ThreadPool>,
    ) -> Vec<Individual>
    where
        R: Rng + ?Sized,
    {
        let count = self
            .generation_size
            .max(grid.edge_count() * self.seed_factor);
        let tasks = (0..count)
            .map(|_| Task::Mutate {
                parent: grid,
                seed: rng.random(),
            })
            .collect();

        let mut generation = self.evaluate(pool, tasks);
        generation.push(Individual::new(grid.clone()));
        generation.sort_by_key(|individual| individual.fitness);
        generation.truncate(self.generation_size);
        generation
    }

    fn breed<R>(
        &self,
        old: &[Individual],
        rng: &mut R,
        pool: Option<&ThreadPool>,
    ) -> Vec<Individual>
    where
        R: Rng + ?Sized,
    {
        let elite = self.elite_count().min(old.len());
        let mut next: Vec<Individual> = old[..elite].to_vec();

        let mut parents: Vec<&Individual> = old[..(old.len() / 2).max(1)].iter().collect();
        parents.shuffle(rng);

        let mutants = (self.generation_size * self.mutation_percent / 100).min(parents.len());
        let wanted = self.generation_size.saturating_sub(elite);
        let mut tasks: Vec<Task<'_>> = parents[..mutants]
            .iter()
            .map(|parent| Task::Mutate {
                parent: &parent.grid,
                seed: rng.random(),
            })
            .collect();

        let mut pairs = parents.iter().cycle();
        while tasks.len() < wanted {
            let (Some(a), Some(b)) = (pairs.next(), pairs.next()) else {
                break;
            };
            tasks.push(Task::Crossover {
                a: &a.grid,
                b: &b.grid,
                seed: rng.random(),
            });
            if tasks.len() < wanted {
                tasks.push(Task::Crossover {
                    a: &b.grid,
                    b: &a.grid,
                    seed: rng.random(),
                });
            }
        }

        next.extend(self.evaluate(pool, tasks));
        next.sort_by_key(|individual| individual.fitness);
        next.truncate(self.generation_size);
        next
    }

    fn should_stop(&self, best: Fitness, started: Instant) -> bool {
        if self.fitness_threshold.is_some_and(|threshold| best <= threshold) {
            debug!("Reached fitness threshold with {best}");
            return true;
        }
        if self
            .time_budget
            .is_some_and(|budget| started.elapsed() >= budget)
        {
            debug!("Time budget exhausted with {best}");
            return true;
        }
        false
    }
}

impl LayoutSearch for GeneticSearch {
    fn search(&self, grid: &Grid) -> Grid {
        if self.generation_size == 0 || self.generation_count == 0 {
            return grid.clone();
        }

        let started = Instant::now();
        let mut rng = Pcg32::seed_from_u64(self.seed);
        let pool = self.pool();

        let mut generation = self.seed_generation(grid, &mut rng, pool.as_ref());
        debug!("Seed generation: {}", stats(&generation));

        for index in 1..self.generation_count {
            let Some(best) = generation.first() else {
                break;
            };
            if self.should_stop(best.fitness, started) {
                break;
            }

            generation = self.breed(&generation, &mut rng, pool.as_ref());
            if index % 100 == 0 {
                debug!("Generation {index}: {}", stats(&generation));
            }
        }

        generation
            .into_iter()
            .next()
            .map_or_else(|| grid.clone(), |individual| individual.grid)
    }
}

fn stats(generation: &[Individual]) -> String {
    let Some(best) = generation.first() else {
        return "empty".to_string();
    };
    let average = generation
        .iter()
        .map(|individual| individual.fitness.crossings as f64)
        .sum::<f64>()
        / generation.len() as f64;
    format!("average {average:.2} crossings, fittest {}", best.fitness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphBuilder;
    use test_log::test;

    fn small() -> GeneticSearch {
        GeneticSearch {
            generation_size: 20,
            generation_count: 30,
            seed_factor: 2,
            threads: Some(2),
            ..GeneticSearch::new(42)
        }
    }

    /// 0 feeds 1..=4, each of them feeds 5..=8 in reverse order, all of
    /// which end in 9
    fn tangled() -> Grid {
        let mut graph = GraphBuilder::new();
        for v in 0..10 {
            graph.add_vertex(v);
        }
        for v in 1..=4 {
            graph.add_edge(&0, &v).unwrap();
            graph.add_edge(&v, &(9 - v)).unwrap();
            graph.add_edge(&(9 - v), &9).unwrap();
        }
        // A shortcut that needs a corridor
        graph.add_edge(&0, &9).unwrap();
        graph.prepare().unwrap().grid().clone()
    }

    #[test]
    fn test_search_improves_fitness() {
        let grid = tangled();
        let start = grid.fitness();
        assert!(start.crossings > 0);

        let best = small().search(&grid);
        assert!(best.fitness() <= start);
        assert!(best.fitness().crossings < start.crossings);
        assert!(best.is_aligned());
        assert!(best.is_rectangular());
        assert_eq!(best.edges().collect::<Vec<_>>(), grid.edges().collect::<Vec<_>>());
    }

    #[test]
    fn test_search_is_reproducible() {
        let grid = tangled();
        let search = small();
        assert_eq!(search.search(&grid).fitness(), search.search(&grid).fitness());
    }

    #[test]
    fn test_fitness_threshold_stops_early() {
        let grid = tangled();
        let search = GeneticSearch {
            generation_count: usize::MAX,
            fitness_threshold: Some(Fitness::new(usize::MAX, 0)),
            ..small()
        };
        // The seed generation already beats the threshold
        assert!(search.search(&grid).fitness() <= grid.fitness());
    }

    #[test]
    fn test_time_budget_stops_search() {
        let grid = tangled();
        let search = GeneticSearch {
            generation_count: usize::MAX,
            time_budget: Some(Duration::from_millis(50)),
            ..small()
        };
        let best = search.search(&grid);
        assert!(best.fitness() <= grid.fitness());
    }

    #[test]
    fn test_breed_keeps_generation_size_and_elite() {
        let grid = tangled();
        let search = small();
        let mut rng = Pcg32::seed_from_u64(1);
        let generation = search.seed_generation(&grid, &mut rng, None);
        assert_eq!(generation.len(), search.generation_size);

        let next = search.breed(&generation, &mut rng, None);
        assert_eq!(next.len(), search.generation_size);
        assert!(next[0].fitness <= generation[0].fitness);
        assert!(next.windows(2).all(|w| w[0].fitness <= w[1].fitness));
    }
}
