use std::collections::HashSet;

use basic_neural::{ActivationFunction, Error, LayerSide, NetworkBuilder, NeuralNetwork};

const XOR: [([f64; 2], [f64; 1]); 4] = [
    ([0.0, 0.0], [0.0]),
    ([0.0, 1.0], [1.0]),
    ([1.0, 0.0], [1.0]),
    ([1.0, 1.0], [0.0]),
];

const OR: [([f64; 2], [f64; 1]); 4] = [
    ([0.0, 0.0], [0.0]),
    ([0.0, 1.0], [1.0]),
    ([1.0, 0.0], [1.0]),
    ([1.0, 1.0], [1.0]),
];

fn train_epochs(network: &mut NeuralNetwork, data: &[([f64; 2], [f64; 1])], epochs: usize) -> f64 {
    let mut last = 0.0;
    for _ in 0..epochs {
        last = 0.0;
        for (input, target) in data {
            last += network.train(input, target).unwrap();
        }
    }
    last
}

fn guess(network: &NeuralNetwork, input: &[f64]) -> f64 {
    network.guess(input).unwrap()[0]
}

#[test]
fn test_weight_and_bias_shapes() {
    for hidden in [vec![], vec![4], vec![3, 3, 3], vec![7, 2]] {
        let network = NetworkBuilder::new(5, 2)
            .hidden_layer_sizes(hidden.clone())
            .seed(1)
            .build()
            .unwrap();
        let topology = network.topology();

        assert_eq!(network.weights().len(), hidden.len() + 1);
        assert_eq!(network.biases().len(), hidden.len() + 1);
        for (i, pair) in topology.windows(2).enumerate() {
            assert_eq!(network.weights()[i].shape(), (pair[1], pair[0]));
            assert_eq!(network.biases()[i].shape(), (pair[1], 1));
        }
    }
}

#[test]
fn test_initial_values_in_unit_interval() {
    let network = NetworkBuilder::new(10, 10).hidden_layers(3, 20).seed(2).build().unwrap();
    for matrix in network.weights().iter().chain(network.biases()) {
        assert!(matrix.data().iter().all(|v| (-1.0..=1.0).contains(v)));
    }
}

#[test]
fn test_guess_wrong_input_dimension() {
    let network = NetworkBuilder::new(1, 1).seed(3).build().unwrap();
    let err = network.guess(&[1.0, 2.0]).unwrap_err();
    assert!(matches!(
        err,
        Error::WrongDimension {
            layer: LayerSide::Input,
            expected: 1,
            actual: 2
        }
    ));
    assert_eq!(err.to_string(), "Expected 1 value(s) for Input-layer but got 2.");
}

#[test]
fn test_train_wrong_dimensions() {
    let mut network = NetworkBuilder::new(2, 4).seed(4).build().unwrap();
    let before = network.copy();

    let err = network.train(&[1.0, 2.0], &[1.0, 2.0]).unwrap_err();
    assert_eq!(err.to_string(), "Expected 4 value(s) for Output-layer but got 2.");

    let err = network.train(&[1.0], &[1.0, 2.0, 3.0, 4.0]).unwrap_err();
    assert_eq!(err.to_string(), "Expected 2 value(s) for Input-layer but got 1.");

    assert_eq!(network, before);
}

#[test]
fn test_guess_output_length() {
    let network = NetworkBuilder::new(3, 5).hidden_layers(2, 4).seed(5).build().unwrap();
    let output = network.guess(&[0.1, 0.2, 0.3]).unwrap();
    assert_eq!(output.len(), 5);
    assert!(output.iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn test_train_preserves_shapes_and_changes_values() {
    let mut network = NetworkBuilder::new(2, 1).hidden_layers(1, 4).seed(6).build().unwrap();
    let before = network.copy();
    network.train(&[1.0, 0.0], &[1.0]).unwrap();

    for (old, new) in before.weights().iter().zip(network.weights()) {
        assert_eq!(old.shape(), new.shape());
        assert_ne!(old, new);
    }
    for (old, new) in before.biases().iter().zip(network.biases()) {
        assert_eq!(old.shape(), new.shape());
        assert_ne!(old, new);
    }
}

#[test]
fn test_or_is_learnable() {
    let mut network = NetworkBuilder::new(2, 1).seed(11).build().unwrap();
    let first = train_epochs(&mut network, &OR, 1);
    let last = train_epochs(&mut network, &OR, 2000);
    assert!(last < first);

    assert!(guess(&network, &[0.0, 0.0]) < 0.3);
    assert!(guess(&network, &[0.0, 1.0]) > 0.7);
    assert!(guess(&network, &[1.0, 0.0]) > 0.7);
    assert!(guess(&network, &[1.0, 1.0]) > 0.7);
}

#[test]
fn test_xor_is_learnable_with_hidden_layer() {
    let mut network = NetworkBuilder::new(2, 1)
        .hidden_layers(1, 4)
        .learning_rate(0.1)
        .seed(12)
        .build()
        .unwrap();
    train_epochs(&mut network, &XOR, 10_000);

    assert!(guess(&network, &[0.0, 0.0]) < 0.3);
    assert!(guess(&network, &[0.0, 1.0]) > 0.7);
    assert!(guess(&network, &[1.0, 0.0]) > 0.7);
    assert!(guess(&network, &[1.0, 1.0]) < 0.3);
}

#[test]
fn test_xor_needs_hidden_layer() {
    let mut network = NetworkBuilder::new(2, 1)
        .learning_rate(0.1)
        .seed(12)
        .build()
        .unwrap();
    train_epochs(&mut network, &XOR, 10_000);

    let solved = guess(&network, &[0.0, 0.0]) < 0.3
        && guess(&network, &[0.0, 1.0]) > 0.7
        && guess(&network, &[1.0, 0.0]) > 0.7
        && guess(&network, &[1.0, 1.0]) < 0.3;
    assert!(!solved);
}

#[test]
fn test_parallel_training_matches_sequential() {
    let builder = NetworkBuilder::new(100, 50).hidden_layer_sizes(vec![200, 200]).seed(13);
    let mut sequential = builder.clone().build().unwrap();
    let mut parallel = builder.parallel_training(4).build().unwrap();
    assert!(parallel.is_parallel());
    assert_eq!(sequential.weights(), parallel.weights());

    let input: Vec<f64> = (0..100u32).map(|i| f64::from(i) / 100.0).collect();
    let target: Vec<f64> = (0..50u32).map(|i| f64::from(i % 2)).collect();
    for _ in 0..3 {
        let a = sequential.train(&input, &target).unwrap();
        let b = parallel.train(&input, &target).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    assert_eq!(sequential.weights(), parallel.weights());
    assert_eq!(sequential.biases(), parallel.biases());
    assert_eq!(sequential.guess(&input).unwrap(), parallel.guess(&input).unwrap());
}

#[test]
fn test_parallel_xor() {
    let mut network = NetworkBuilder::new(2, 1)
        .hidden_layers(1, 4)
        .parallel_training(2)
        .seed(12)
        .build()
        .unwrap();
    train_epochs(&mut network, &XOR, 10_000);
    assert!(guess(&network, &[0.0, 1.0]) > 0.7);
    assert!(guess(&network, &[1.0, 1.0]) < 0.3);
    network.close();
    network.close();
    assert!(guess(&network, &[1.0, 0.0]) > 0.7);
}

#[test]
fn test_merge_topology_mismatch() {
    let a = NetworkBuilder::new(1, 4).hidden_layers(2, 3).seed(14).build().unwrap();
    let b = NetworkBuilder::new(2, 5).hidden_layers(3, 4).seed(15).build().unwrap();
    let err = a.merge(&b).unwrap_err();
    assert!(matches!(err, Error::TopologyMismatch { .. }));
    assert_eq!(
        err.to_string(),
        "The dimensions of these two neural networks don't match: [1, 3, 3, 4], [2, 4, 4, 4, 5]"
    );
}

#[test]
fn test_merge_rejects_same_count_different_sizes() {
    let a = NetworkBuilder::new(2, 1).hidden_layer_sizes(vec![4, 3]).seed(1).build().unwrap();
    let b = NetworkBuilder::new(2, 1).hidden_layer_sizes(vec![3, 4]).seed(2).build().unwrap();
    assert!(a.merge(&b).is_err());
}

#[test]
fn test_merge_takes_each_element_from_a_parent() {
    let a = NetworkBuilder::new(4, 3).hidden_layers(2, 6).seed(16).build().unwrap();
    let b = NetworkBuilder::new(4, 3).hidden_layers(2, 6).seed(17).build().unwrap();
    let child = a.merge(&b).unwrap();

    let mut from_a = 0;
    let mut from_b = 0;
    let parents = a.weights().iter().chain(a.biases()).zip(b.weights().iter().chain(b.biases()));
    let children = child.weights().iter().chain(child.biases());
    for ((ma, mb), mc) in parents.zip(children) {
        for ((x, y), z) in ma.data().iter().zip(mb.data()).zip(mc.data()) {
            if z.to_bits() == x.to_bits() {
                from_a += 1;
            } else if z.to_bits() == y.to_bits() {
                from_b += 1;
            } else {
                panic!("{z} came from neither parent");
            }
        }
    }
    assert!(from_a > 0 && from_b > 0);
}

#[test]
fn test_merge_is_deterministic_per_seed() {
    let build = || {
        let a = NetworkBuilder::new(3, 2).hidden_layers(1, 5).seed(20).build().unwrap();
        let b = NetworkBuilder::new(3, 2).hidden_layers(1, 5).seed(21).build().unwrap();
        a.merge_with_ratio(&b, 0.3).unwrap()
    };
    assert_eq!(build(), build());
}

#[test]
fn test_mutate_zero_changes_nothing() {
    let mut network = NetworkBuilder::new(3, 2).hidden_layers(1, 4).seed(22).build().unwrap();
    let before = network.copy();
    network.mutate(0.0).unwrap();
    assert_eq!(network, before);
}

#[test]
fn test_mutate_one_changes_everything() {
    let mut network = NetworkBuilder::new(3, 2).hidden_layers(1, 4).seed(23).build().unwrap();
    let before = network.copy();
    network.mutate(1.0).unwrap();

    let old = before.weights().iter().chain(before.biases());
    let new = network.weights().iter().chain(network.biases());
    for (o, n) in old.zip(new) {
        for (x, y) in o.data().iter().zip(n.data()) {
            assert_ne!(x.to_bits(), y.to_bits());
        }
    }
}

#[test]
fn test_copy_is_independent() {
    let original = NetworkBuilder::new(2, 2).hidden_layers(1, 3).seed(24).build().unwrap();
    let mut copy = original.copy();
    assert_eq!(copy, original);

    copy.mutate(1.0).unwrap();
    copy.train(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
    assert_ne!(copy, original);
    assert_eq!(original.config(), copy.config());
}

#[test]
fn test_copies_share_random_stream() {
    let mut a = NetworkBuilder::new(2, 2).seed(25).build().unwrap();
    let mut b = a.copy();
    let mut c = NetworkBuilder::new(2, 2).seed(25).build().unwrap();
    let mut d = c.copy();

    // a and c draw first, so b and d continue the same shared stream.
    a.mutate(1.0).unwrap();
    c.mutate(1.0).unwrap();
    b.mutate(1.0).unwrap();
    d.mutate(1.0).unwrap();

    assert_eq!(a, c);
    assert_eq!(b, d);
    assert_ne!(a, b);
}

#[test]
fn test_equality_and_hash() {
    let a = NetworkBuilder::new(2, 1).seed(26).build().unwrap();
    let b = NetworkBuilder::new(2, 1).seed(26).build().unwrap();
    let c = NetworkBuilder::new(2, 1).seed(27).build().unwrap();
    let d = NetworkBuilder::new(2, 1).seed(26).learning_rate(0.2).build().unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);

    let set: HashSet<_> = [a, b, c, d].into_iter().collect();
    assert_eq!(set.len(), 3);
}

#[test]
fn test_activation_functions_train() {
    for activation in [
        ActivationFunction::Sigmoid,
        ActivationFunction::Tanh,
        ActivationFunction::Relu,
        ActivationFunction::LeakyRelu,
    ] {
        let mut network = NetworkBuilder::new(2, 1)
            .hidden_layers(1, 3)
            .activation_function(activation)
            .learning_rate(0.01)
            .seed(28)
            .build()
            .unwrap();
        train_epochs(&mut network, &OR, 10);
        assert!(network.guess(&[1.0, 0.0]).unwrap()[0].is_finite());
    }
}

#[test]
fn test_convenience_constructors() {
    let a = NeuralNetwork::with_shape(3, 1).unwrap();
    assert_eq!(a.topology(), vec![3, 1]);
    assert_ne!(a.seed(), 0);

    let b = NeuralNetwork::with_hidden(3, 6, 2).unwrap();
    assert_eq!(b.topology(), vec![3, 6, 2]);

    let c = NeuralNetwork::with_layers(3, 2, 6, 2).unwrap();
    assert_eq!(c.topology(), vec![3, 6, 6, 2]);
    assert!(!c.is_parallel());
    assert_eq!(c.worker_count(), None);
}

#[test]
fn test_concurrent_guesses() {
    let network = NetworkBuilder::new(2, 1).hidden_layers(1, 4).seed(29).build().unwrap();
    let expected = network.guess(&[0.5, 0.5]).unwrap();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| assert_eq!(network.guess(&[0.5, 0.5]).unwrap(), expected));
        }
    });
}
