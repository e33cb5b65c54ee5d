//! Graph assembly throughput over growing sample sets.

use std::hint::black_box;
use std::path::PathBuf;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use snpforge::config::{PipelineConfig, Tool, ToolLocator, Toolchain};
use snpforge::graph::{GraphBuilder, OutputLayout};
use snpforge::resources::ResourceBudget;
use snpforge::samples::{Sample, SampleKind};

struct FixedLocator;

impl ToolLocator for FixedLocator {
    fn locate(&self, tool: Tool) -> Option<PathBuf> {
        Some(PathBuf::from("/opt/tools").join(tool.binary()))
    }
}

/// Contig samples need no filesystem probing, so graphs can be assembled
/// over purely synthetic inputs.
fn synthetic_samples(count: usize) -> Vec<Sample> {
    (0..count)
        .map(|i| {
            let source = PathBuf::from(format!("/data/contigs/iso{i:04}.fasta"));
            Sample {
                id: format!("iso{i:04}"),
                kind: SampleKind::ContigFile,
                source_path: source.clone(),
                dependency_files: vec![source],
            }
        })
        .collect()
}

fn bench_graph_build(c: &mut Criterion) {
    let toolchain = Toolchain::resolve(&FixedLocator).expect("stub locator resolves every tool");
    let layout = OutputLayout::new("/data/run", "core");
    let config = PipelineConfig::new("/data/run").with_cpus(32);

    let mut group = c.benchmark_group("graph_build");
    for count in [4usize, 32, 256] {
        let samples = synthetic_samples(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(count),
            &samples,
            |b, samples| {
                b.iter(|| {
                    let budget = ResourceBudget::allocate(32, samples.len(), 5_000_000);
                    let graph = GraphBuilder::new(&config, &layout, budget, &toolchain)
                        .with_samples(samples.clone())
                        .with_reference_source(Some(PathBuf::from("/data/refs/ref.fa")))
                        .build()
                        .expect("synthetic graphs are structurally valid");
                    black_box(graph)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_graph_build);
criterion_main!(benches);
