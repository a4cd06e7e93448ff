//! Basic usage: a stat, two modifiers, lazy recomputation.

use modgraph::{EffectGraph, ModifierKind, SumAggregate};

fn main() {
    let mut graph = EffectGraph::new();

    let hp = graph.add_stat("HP", Box::new(SumAggregate));
    let base = graph
        .add_modifier("base", ModifierKind::Referenced, 100.0, None)
        .expect("create base");
    let buff = graph
        .add_modifier("buff", ModifierKind::Referenced, 20.0, None)
        .expect("create buff");

    graph.attach(hp, base).expect("attach base");
    graph.attach(hp, buff).expect("attach buff");
    println!("HP = {}", graph.value(hp).expect("read HP")); // 120

    graph.set_value(buff, 5.0).expect("weaken buff");
    println!("dirty after write: {}", graph.is_dirty(hp).unwrap());
    println!("HP = {}", graph.value(hp).expect("read HP")); // 105

    graph.delete(buff).expect("delete buff");
    println!("HP = {}", graph.value(hp).expect("read HP")); // 100

    let snapshot = graph.snapshot(hp).expect("snapshot HP");
    println!(
        "snapshot: {}",
        serde_json::to_string_pretty(&snapshot).expect("serialize")
    );
}
