//! Fitness evaluators: the single point where
//! genomes meet the task they are evolved for.
use super::EvaluationError;
use crate::{Genome, GenomeId};

use tracing::warn;

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Fitness assigned to genomes whose evaluation failed.
pub const FLOOR_FITNESS: f32 = 0.0;

/// The outcome of evaluating a single genome.
pub type Evaluation = (GenomeId, Result<f32, EvaluationError>);

/// Assigns fitness values to a generation of genomes.
///
/// Called exactly once per generation with the whole
/// genome table. Results are matched back to genomes by
/// id, so they may come in any order; genomes without a
/// result receive the [`FLOOR_FITNESS`].
///
/// Any `FnMut(&G) -> f32` is an evaluator, which
/// evaluates genomes sequentially.
///
/// # Examples
/// ```
/// use evoneat::{Evaluation, FitnessEvaluator, Genome};
/// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
///
/// struct GeneCounter;
///
/// impl FitnessEvaluator<NNGenome> for GeneCounter {
///     fn evaluate(&mut self, genomes: &[NNGenome]) -> Vec<Evaluation> {
///         genomes
///             .iter()
///             .map(|g| (g.id(), Ok(g.genes().count() as f32)))
///             .collect()
///     }
/// }
///
/// let genomes = vec![NNGenome::new(0, &GeneticConfig::zero())];
/// assert_eq!(GeneCounter.evaluate(&genomes), vec![(0, Ok(0.0))]);
/// ```
pub trait FitnessEvaluator<G> {
    fn evaluate(&mut self, genomes: &[G]) -> Vec<Evaluation>;
}

impl<G, F> FitnessEvaluator<G> for F
where
    G: Genome,
    F: FnMut(&G) -> f32,
{
    fn evaluate(&mut self, genomes: &[G]) -> Vec<Evaluation> {
        genomes.iter().map(|g| (g.id(), Ok((self)(g)))).collect()
    }
}

/// Adapts a fallible evaluation function.
/// Errors are reported as [`EvaluationError::Failed`].
///
/// # Examples
/// ```
/// use evoneat::{EvaluationError, Fallible, FitnessEvaluator};
/// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
///
/// let mut evaluator = Fallible(|_: &NNGenome| "simulation crashed".parse::<f32>());
/// let genomes = vec![NNGenome::new(0, &GeneticConfig::zero())];
/// assert!(matches!(
///     evaluator.evaluate(&genomes)[0],
///     (0, Err(EvaluationError::Failed(_)))
/// ));
/// ```
pub struct Fallible<F>(pub F);

impl<G, F, E> FitnessEvaluator<G> for Fallible<F>
where
    G: Genome,
    F: FnMut(&G) -> Result<f32, E>,
    E: fmt::Display,
{
    fn evaluate(&mut self, genomes: &[G]) -> Vec<Evaluation> {
        genomes
            .iter()
            .map(|g| {
                let fitness = (self.0)(g).map_err(|e| EvaluationError::Failed(e.to_string()));
                (g.id(), fitness)
            })
            .collect()
    }
}

/// Runs evaluations on a fixed number of worker threads,
/// and gives up on those that take longer than a timeout.
///
/// Each genome's timer starts when a worker picks it up, so
/// genomes waiting in the queue are never charged for the
/// time spent on others. A worker stuck past the timeout is
/// left detached and replaced with a fresh one; its genome
/// gets [`EvaluationError::TimedOut`]. A panicking evaluation
/// yields [`EvaluationError::Failed`] and does not cost the
/// pool its worker.
///
/// # Examples
/// ```
/// use evoneat::{EvaluationError, FitnessEvaluator, TimeoutEvaluator};
/// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
///
/// use std::num::NonZeroUsize;
/// use std::time::Duration;
///
/// let config = GeneticConfig::zero();
/// let genomes: Vec<_> = (0..6).map(|id| NNGenome::new(id, &config)).collect();
/// let mut evaluator = TimeoutEvaluator::new(
///     |g: &NNGenome| g.id() as f32,
///     Duration::from_secs(1),
/// )
/// .with_workers(NonZeroUsize::new(2).unwrap());
///
/// let results = evaluator.evaluate(&genomes);
/// assert!(results.iter().all(|(id, fitness)| fitness == &Ok(*id as f32)));
/// ```
pub struct TimeoutEvaluator<F> {
    function: Arc<F>,
    timeout: Duration,
    workers: NonZeroUsize,
}

/// Messages sent by evaluation workers.
enum WorkerMessage {
    Started(usize, Instant),
    Finished(usize, Result<f32, EvaluationError>),
}

/// Genomes not yet picked up by a worker, with their table index.
type JobQueue<G> = Arc<Mutex<std::vec::IntoIter<(usize, G)>>>;

impl<F> TimeoutEvaluator<F> {
    /// Creates an evaluator with one worker per available core.
    pub fn new(function: F, timeout: Duration) -> TimeoutEvaluator<F> {
        let workers = thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
        TimeoutEvaluator {
            function: Arc::new(function),
            timeout,
            workers,
        }
    }

    /// Sets the number of evaluations that may run at once.
    pub fn with_workers(self, workers: NonZeroUsize) -> TimeoutEvaluator<F> {
        TimeoutEvaluator { workers, ..self }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }
}

impl<F> TimeoutEvaluator<F> {
    /// Starts a worker that evaluates queued genomes until
    /// the queue runs dry. Returns whether it could be spawned.
    fn spawn_worker<G>(&self, jobs: &JobQueue<G>, sender: &mpsc::Sender<WorkerMessage>) -> bool
    where
        G: Send + 'static,
        F: Fn(&G) -> f32 + Send + Sync + 'static,
    {
        let jobs = Arc::clone(jobs);
        let sender = sender.clone();
        let function = Arc::clone(&self.function);
        let spawned = thread::Builder::new()
            .name("evoneat-evaluator".to_string())
            .spawn(move || loop {
                let job = match jobs.lock() {
                    Ok(mut queue) => queue.next(),
                    Err(_) => None,
                };
                let Some((index, genome)) = job else {
                    break;
                };
                if sender.send(WorkerMessage::Started(index, Instant::now())).is_err() {
                    break;
                }
                let fitness = panic::catch_unwind(AssertUnwindSafe(|| (*function)(&genome)))
                    .map_err(|_| EvaluationError::Failed("evaluation panicked".to_string()));
                // Nobody listens once the generation has moved on.
                if sender.send(WorkerMessage::Finished(index, fitness)).is_err() {
                    break;
                }
            });
        if let Err(error) = &spawned {
            warn!(%error, "could not spawn evaluation worker");
        }
        spawned.is_ok()
    }
}

impl<G, F> FitnessEvaluator<G> for TimeoutEvaluator<F>
where
    G: Genome + Clone + Send + 'static,
    F: Fn(&G) -> f32 + Send + Sync + 'static,
{
    fn evaluate(&mut self, genomes: &[G]) -> Vec<Evaluation> {
        let mut results: Vec<Option<Result<f32, EvaluationError>>> = vec![None; genomes.len()];
        let mut outstanding = genomes.len();
        let jobs: JobQueue<G> = Arc::new(Mutex::new(
            genomes.iter().cloned().enumerate().collect::<Vec<_>>().into_iter(),
        ));
        let (sender, receiver) = mpsc::channel();

        let mut live_workers = (0..self.workers.get().min(genomes.len()))
            .filter(|_| self.spawn_worker(&jobs, &sender))
            .count();
        // Evaluation start times, by table index.
        let mut running: BTreeMap<usize, Instant> = BTreeMap::new();

        while outstanding > 0 {
            if live_workers == 0 {
                for result in results.iter_mut().filter(|r| r.is_none()) {
                    *result = Some(Err(EvaluationError::Failed(
                        "no evaluation worker available".to_string(),
                    )));
                }
                break;
            }

            let wait = running
                .values()
                .min()
                .map_or(self.timeout, |started| {
                    (*started + self.timeout).saturating_duration_since(Instant::now())
                });
            match receiver.recv_timeout(wait) {
                Ok(WorkerMessage::Started(index, started)) => {
                    running.insert(index, started);
                }
                Ok(WorkerMessage::Finished(index, fitness)) => {
                    running.remove(&index);
                    if results[index].is_none() {
                        results[index] = Some(fitness);
                        outstanding -= 1;
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    let now = Instant::now();
                    let expired: Vec<usize> = running
                        .iter()
                        .filter(|(_, started)| now.duration_since(**started) >= self.timeout)
                        .map(|(index, _)| *index)
                        .collect();
                    for index in expired {
                        running.remove(&index);
                        results[index] = Some(Err(EvaluationError::TimedOut(self.timeout)));
                        outstanding -= 1;
                        live_workers -= 1;
                        let queued = jobs.lock().map_or(0, |queue| queue.len());
                        if queued > 0 && self.spawn_worker(&jobs, &sender) {
                            live_workers += 1;
                        }
                    }
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        genomes
            .iter()
            .zip(results)
            .map(|(genome, result)| (genome.id(), result.unwrap_or(Err(EvaluationError::Missing))))
            .collect()
    }
}

/// Evaluates genomes across rayon's global thread pool.
///
/// # Examples
/// ```
/// use evoneat::{FitnessEvaluator, ParallelEvaluator};
/// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
///
/// let config = GeneticConfig::zero();
/// let genomes: Vec<_> = (0..8).map(|id| NNGenome::new(id, &config)).collect();
/// let results = ParallelEvaluator(|g: &NNGenome| g.nodes().count() as f32).evaluate(&genomes);
/// assert!(results.iter().all(|(_, fitness)| fitness == &Ok(2.0)));
/// ```
#[cfg(feature = "parallel")]
pub struct ParallelEvaluator<F>(pub F);

#[cfg(feature = "parallel")]
impl<G, F> FitnessEvaluator<G> for ParallelEvaluator<F>
where
    G: Genome + Sync,
    F: Fn(&G) -> f32 + Sync,
{
    fn evaluate(&mut self, genomes: &[G]) -> Vec<Evaluation> {
        use rayon::prelude::*;

        let function = &self.0;
        genomes
            .par_iter()
            .map(|g| (g.id(), Ok(function(g))))
            .collect()
    }
}

/// Checks a fitness value reported by an evaluator.
pub(super) fn validate_fitness(fitness: f32) -> Result<f32, EvaluationError> {
    if fitness.is_finite() && fitness >= 0.0 {
        Ok(fitness)
    } else {
        Err(EvaluationError::InvalidFitness(fitness))
    }
}
