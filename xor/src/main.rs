use evoneat::logging::{EventLog, EvolutionLogger, ReportEvent, ReportingLevel};
use evoneat::{EvolutionError, ParallelEvaluator, Population, PopulationConfig, SpeciesFitnessFunc};
use evoneat_nn::genomics::{ActivationType, GeneticConfig, NNGenome};
use evoneat_nn::networks::FunctionApproximatorNetwork;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use std::error::Error;
use std::num::NonZeroUsize;

/// Allowed error margin for neural net answers.
const ERROR_MARGIN: f32 = 0.3;
/// Fitness of a network that answers every case correctly.
const PERFECT_FITNESS: f32 = 16.0;
const MAX_GENERATIONS: usize = 300;

const XOR_CASES: [([f32; 3], f32); 4] = [
    ([1.0, 0.0, 0.0], 0.0),
    ([1.0, 0.0, 1.0], 1.0),
    ([1.0, 1.0, 0.0], 1.0),
    ([1.0, 1.0, 1.0], 0.0),
];

fn network_answers(genome: &NNGenome) -> Vec<f32> {
    let mut network = FunctionApproximatorNetwork::<1>::from(genome);
    XOR_CASES
        .iter()
        .map(|(input, _)| network.evaluate_at(input)[0])
        .collect()
}

fn evaluate_xor(genome: &NNGenome) -> f32 {
    let error: f32 = network_answers(genome)
        .into_iter()
        .zip(XOR_CASES.iter())
        .map(|(answer, (_, expected))| (answer - expected).abs())
        .map(|e| if e < ERROR_MARGIN { 0.0 } else { e })
        .sum();

    (4.0 - error).powf(2.0)
}

fn genetic_config() -> GeneticConfig {
    GeneticConfig {
        input_count: NonZeroUsize::new(3).unwrap(),
        output_count: NonZeroUsize::new(1).unwrap(),
        activation_types: vec![ActivationType::Sigmoid],
        output_activation_types: vec![ActivationType::Sigmoid],
        mate_by_averaging_chance: 0.4,
        reenable_chance: 0.25,
        noncommon_inheritance_chance: 1.0,
        initial_expression_chance: 1.0,
        weight_bound: 5.0,
        weight_mutation_chance: 0.8,
        weight_reset_chance: 0.1,
        weight_nudge_chance: 0.9,
        weight_mutation_power: 2.5,
        toggle_expression_chance: 0.01,
        node_addition_mutation_chance: 0.03,
        gene_addition_mutation_chance: 0.05,
        max_gene_addition_mutation_attempts: 20,
        recursion_chance: 0.0,
        excess_gene_factor: 1.0,
        disjoint_gene_factor: 1.0,
        common_weight_factor: 0.4,
    }
}

fn population_config() -> PopulationConfig {
    PopulationConfig {
        size: NonZeroUsize::new(150).unwrap(),
        distance_threshold: 3.0,
        elitism: 1,
        survival_threshold: 0.2,
        sexual_reproduction_chance: 0.6,
        interspecies_mating_chance: 0.001,
        min_species_size: 2,
        max_stagnation: NonZeroUsize::new(15).unwrap(),
        species_fitness_func: SpeciesFitnessFunc::Max,
        species_elitism: 2,
        fitness_threshold: Some(PERFECT_FITNESS),
        seed: None,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut population = Population::<_, _, NNGenome>::new(population_config(), genetic_config())?;
    let events = EventLog::new();
    population.add_reporter(events.clone());

    let mut evaluator = ParallelEvaluator(evaluate_xor);
    let mut logger = EvolutionLogger::new(ReportingLevel::SpeciesChampions);
    let mut solution = None;

    for _ in 0..MAX_GENERATIONS {
        population.evaluate_fitness(&mut evaluator);
        logger.log(
            &population,
            &|g: &NNGenome| {
                [
                    g.fitness().unwrap_or(0.0),
                    g.genes().filter(|gene| gene.enabled()).count() as f32,
                    g.nodes().count() as f32,
                ]
            },
            ["fitness", "enabled genes", "nodes"],
        );

        let champion = population.champion();
        if champion.and_then(|c| c.fitness()).map_or(false, |f| f >= PERFECT_FITNESS) {
            solution = champion.cloned();
            break;
        }

        match population.evolve() {
            Ok(()) => {}
            Err(EvolutionError::Extinction { generation }) => {
                warn!(generation, "population went extinct");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(log) = logger.iter().last() {
        info!("last snapshot:\n{}", log);
    }
    let extinctions = events
        .events()
        .iter()
        .filter(|e| matches!(e, ReportEvent::SpeciesRemoved { .. }))
        .count();
    info!(
        generations = population.generation() + 1,
        species_removed = extinctions,
        "evolution finished"
    );

    let champion = match solution {
        Some(champion) => champion,
        None => {
            warn!(
                best_fitness = population.statistics().best_fitness_history().last().copied(),
                "no solution found in {} generations", MAX_GENERATIONS
            );
            return Ok(());
        }
    };
    info!(genome = champion.id(), "solution found:\n{}", champion);

    // Save the champion, then check the reloaded copy answers the same.
    let saved = ron::to_string(&champion)?;
    let reloaded: NNGenome = ron::from_str(&saved)?;
    let answers = network_answers(&champion);
    let reloaded_answers = network_answers(&reloaded);
    info!(?answers, "champion answers");
    if answers == reloaded_answers {
        info!(bytes = saved.len(), "champion reloaded from ron");
    } else {
        warn!(?answers, ?reloaded_answers, "reloaded champion answers differently");
    }

    Ok(())
}
