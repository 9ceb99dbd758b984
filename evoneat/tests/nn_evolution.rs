use evoneat::logging::{EventLog, ReportEvent};
use evoneat::{
    ConfigurationError, EvaluationError, Fallible, Population, PopulationConfig,
    SpeciesFitnessFunc, SpeciesID, TimeoutEvaluator, FLOOR_FITNESS,
};
use evoneat_nn::genomics::{ActivationType, GeneticConfig, History, NNGenome};
use evoneat_nn::networks::FunctionApproximatorNetwork;

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

type NNPopulation = Population<GeneticConfig, History, NNGenome>;

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
        node_addition_mutation_chance: 0.1,
        gene_addition_mutation_chance: 0.2,
        max_gene_addition_mutation_attempts: 20,
        recursion_chance: 0.0,
        excess_gene_factor: 1.0,
        disjoint_gene_factor: 1.0,
        common_weight_factor: 0.4,
    }
}

fn population_config(seed: u64) -> PopulationConfig {
    PopulationConfig {
        size: NonZeroUsize::new(60).unwrap(),
        distance_threshold: 1.5,
        elitism: 1,
        survival_threshold: 0.3,
        sexual_reproduction_chance: 0.6,
        interspecies_mating_chance: 0.01,
        min_species_size: 1,
        max_stagnation: NonZeroUsize::new(5).unwrap(),
        species_fitness_func: SpeciesFitnessFunc::Max,
        species_elitism: 2,
        fitness_threshold: None,
        seed: Some(seed),
    }
}

fn evaluate_xor(genome: &NNGenome) -> f32 {
    let mut network = FunctionApproximatorNetwork::<1>::from(genome);
    let cases = [
        ([1.0, 0.0, 0.0], 0.0),
        ([1.0, 0.0, 1.0], 1.0),
        ([1.0, 1.0, 0.0], 1.0),
        ([1.0, 1.0, 1.0], 0.0),
    ];
    let error: f32 = cases
        .iter()
        .map(|(input, expected)| (network.evaluate_at(input)[0] - expected).abs())
        .sum();

    (4.0 - error).powf(2.0)
}

#[test]
fn generations_keep_their_size() {
    let mut population = NNPopulation::new(population_config(7), genetic_config()).unwrap();

    let outcome = population.epoch(12, &mut evaluate_xor).unwrap();

    assert_eq!(outcome.generations, 12);
    assert!(!outcome.solved);
    assert!(outcome.champion.is_some());
    assert_eq!(population.generation(), 12);
    assert_eq!(population.genomes().len(), 60);
    assert_eq!(population.statistics().best_fitness_history().len(), 12);
}

#[test]
fn seeded_runs_are_reproducible() {
    let run = |seed| {
        let mut population = NNPopulation::new(population_config(seed), genetic_config()).unwrap();
        population.epoch(8, &mut evaluate_xor).unwrap();
        (
            population.statistics().best_fitness_history().to_vec(),
            population.species().iter().map(|s| s.id()).collect::<Vec<_>>(),
            population.history().next_gene_innovation(),
        )
    };

    assert_eq!(run(3), run(3));
}

#[test]
fn innovation_numbers_identify_the_same_structure() {
    let mut population = NNPopulation::new(population_config(11), genetic_config()).unwrap();
    population.epoch(15, &mut evaluate_xor).unwrap();
    population.evaluate_fitness(&mut evaluate_xor);

    let mut endpoints = HashMap::new();
    for genome in population.genomes() {
        for gene in genome.genes() {
            let known = endpoints.entry(gene.innovation()).or_insert(gene.endpoints());
            assert_eq!(*known, gene.endpoints(), "gene {} changed endpoints", gene.innovation());
        }
    }
}

#[test]
fn species_ids_are_never_reused() {
    let mut population = NNPopulation::new(population_config(5), genetic_config()).unwrap();
    let events = EventLog::new();
    population.add_reporter(events.clone());

    let mut removed = HashSet::new();
    for _ in 0..20 {
        population.evaluate_fitness(&mut evaluate_xor);
        population.evolve().unwrap();
        for species in population.species() {
            assert!(!removed.contains(&species.id()));
        }
        for event in events.events() {
            if let ReportEvent::SpeciesRemoved { species, .. } = event {
                removed.insert(species);
            }
        }
    }

    let created: Vec<SpeciesID> = events
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ReportEvent::SpeciesCreated { species, .. } => Some(species),
            _ => None,
        })
        .collect();
    let unique: HashSet<_> = created.iter().collect();
    assert_eq!(unique.len(), created.len());
}

#[test]
fn saved_populations_resume_evolution() {
    let mut population = NNPopulation::new(population_config(13), genetic_config()).unwrap();
    population.epoch(5, &mut evaluate_xor).unwrap();

    let saved = ron::to_string(&population).unwrap();
    let mut restored: NNPopulation = ron::from_str(&saved).unwrap();

    assert_eq!(restored.generation(), population.generation());
    assert_eq!(
        restored.genomes().iter().map(|g| g.id()).collect::<Vec<_>>(),
        population.genomes().iter().map(|g| g.id()).collect::<Vec<_>>()
    );
    assert_eq!(
        restored.species().iter().map(|s| s.id()).collect::<Vec<_>>(),
        population.species().iter().map(|s| s.id()).collect::<Vec<_>>()
    );
    assert_eq!(
        restored.history().next_gene_innovation(),
        population.history().next_gene_innovation()
    );

    restored.epoch(5, &mut evaluate_xor).unwrap();
    assert_eq!(restored.generation(), 10);
    assert_eq!(restored.genomes().len(), 60);
}

#[test]
fn slow_evaluations_time_out() {
    let mut population = NNPopulation::new(
        PopulationConfig {
            size: NonZeroUsize::new(4).unwrap(),
            ..population_config(1)
        },
        genetic_config(),
    )
    .unwrap();
    let events = EventLog::new();
    population.add_reporter(events.clone());

    let mut evaluator = TimeoutEvaluator::new(
        |g: &NNGenome| {
            if g.id() == 0 {
                thread::sleep(Duration::from_secs(2));
            }
            1.0
        },
        Duration::from_millis(200),
    );
    population.evaluate_fitness(&mut evaluator);

    for genome in population.genomes() {
        let expected = if genome.id() == 0 { FLOOR_FITNESS } else { 1.0 };
        assert_eq!(genome.fitness(), Some(expected));
    }
    let failures: Vec<_> = events
        .events()
        .into_iter()
        .filter(|e| matches!(e, ReportEvent::EvaluationFailed { genome: 0, .. }))
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(population.evolve().is_ok());
}

#[test]
fn failing_evaluations_do_not_stop_evolution() {
    let mut population = NNPopulation::new(population_config(2), genetic_config()).unwrap();
    let mut evaluator = Fallible(|g: &NNGenome| {
        if g.id() % 2 == 0 {
            Err(EvaluationError::Failed("crashed".to_string()))
        } else {
            Ok(evaluate_xor(g))
        }
    });

    let outcome = population.epoch(3, &mut evaluator).unwrap();
    assert_eq!(outcome.generations, 3);
    assert!(outcome.champion.map_or(false, |c| c.id() % 2 == 1));
}

#[test]
fn invalid_genetic_configurations_are_rejected() {
    let config = GeneticConfig {
        weight_mutation_chance: 1.5,
        ..genetic_config()
    };
    assert!(matches!(
        NNPopulation::new(population_config(0), config),
        Err(ConfigurationError::OutOfRange { .. })
    ));

    let config = GeneticConfig {
        weight_bound: -1.0,
        ..genetic_config()
    };
    assert!(matches!(
        NNPopulation::new(population_config(0), config),
        Err(ConfigurationError::OutOfRange { parameter: "weight_bound", .. })
    ));
}

#[test]
fn nonconforming_seeds_are_rejected() {
    let other = GeneticConfig {
        input_count: NonZeroUsize::new(2).unwrap(),
        ..genetic_config()
    };
    let seeds = vec![
        NNGenome::new(0, &genetic_config()),
        NNGenome::new(1, &other),
    ];

    assert!(matches!(
        NNPopulation::new_seeded(seeds, population_config(0), genetic_config()),
        Err(ConfigurationError::NonconformingSeedGenome(1))
    ));
}
