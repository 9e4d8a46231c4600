use std::hint::black_box;

use autolink_engine::{
  AutolinkProcessor,
  CandidateSet,
  LinkRule,
  PostCandidate,
  ProcessingContext,
  RunConfigBuilder,
  TermCandidate,
  pattern::{self, PatternFlags},
  shield::{ProtectedTags, shield},
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

const ARTICLE: &str = r#"<article>
  <h1>Getting Started with Rust</h1>
  <p>Rust is a systems programming language. The <a href="/book">Rust Book</a>
  covers ownership, borrowing and lifetimes. Cargo is the Rust package
  manager, and crates.io hosts the community crates.</p>
  <figure><img src="ferris.png" alt="Ferris"><figcaption>Ferris the
  crab</figcaption></figure>
  <p>Async Rust builds on futures. Tokio is the most widely used runtime, and
  many web frameworks are built on top of it.</p>
  <script>window.Rust = { cargo: true };</script>
  <p>Ownership and borrowing are checked at compile time. Cargo builds, tests
  and documents your crates.</p>
</article>"#;

fn candidates(size: u64) -> CandidateSet {
  let mut set = CandidateSet {
    keywords: vec![
      LinkRule::new("Cargo", "https://doc.rust-lang.org/cargo/", false),
      LinkRule::new("Tokio", "https://tokio.rs", false),
    ],
    ..CandidateSet::default()
  };
  for id in 0..size {
    set.posts.push(PostCandidate {
      id,
      title:     format!("Unrelated Post {id}"),
      post_type: "post".to_string(),
      permalink: Some(format!("/posts/{id}")),
    });
  }
  set.posts.push(PostCandidate {
    id:        u64::MAX,
    title:     "Ownership".to_string(),
    post_type: "post".to_string(),
    permalink: Some("/ownership".to_string()),
  });
  set.terms.push(TermCandidate {
    id:       1,
    name:     "Async Rust".to_string(),
    taxonomy: "category".to_string(),
    link:     Some("/category/async".to_string()),
  });
  set
}

fn bench_process(c: &mut Criterion) {
  let mut group = c.benchmark_group("process");
  let context = ProcessingContext::for_url("https://example.com/start");

  let processor = AutolinkProcessor::new(
    RunConfigBuilder::new()
      .max_total_links(10)
      .nofollow(true)
      .open_in_new_tab(true)
      .build(),
  );

  for size in [10_u64, 100, 1000] {
    let set = candidates(size);
    group.bench_with_input(
      BenchmarkId::new("candidates", size),
      &set,
      |b, set| {
        b.iter(|| {
          processor.process(black_box(ARTICLE), black_box(set), &context)
        });
      },
    );
  }

  // One long tag-free paragraph with the only match at its very end
  let set = candidates(10);
  for words in [1_000_u64, 10_000, 50_000] {
    let mut paragraph = String::from("<p>");
    for _ in 0..words {
      paragraph.push_str("word ");
    }
    paragraph.push_str("Cargo</p>");
    group.bench_with_input(
      BenchmarkId::new("long_paragraph", words),
      &paragraph,
      |b, paragraph| {
        b.iter(|| {
          processor.process(black_box(paragraph), black_box(&set), &context)
        });
      },
    );
  }

  group.finish();
}

fn bench_building_blocks(c: &mut Criterion) {
  let mut group = c.benchmark_group("building_blocks");
  let tags = ProtectedTags::new(true, true);

  group.bench_function("shield", |b| {
    b.iter(|| shield(black_box(ARTICLE), black_box(&tags)));
  });

  let flags = PatternFlags {
    case_sensitive: false,
    utf8:           true,
  };
  group.bench_function("pattern_build", |b| {
    b.iter(|| pattern::build(black_box("Rust Book"), flags));
  });

  let pattern = pattern::build("Rust Book", flags);
  if let Ok(pattern) = pattern {
    group.bench_function("linkable_ranges", |b| {
      b.iter(|| pattern::linkable_ranges(black_box(ARTICLE)));
    });
    group.bench_function("replace_bounded", |b| {
      b.iter(|| {
        pattern.replace_bounded(black_box(ARTICLE), 1, |m| format!("[{m}]"))
      });
    });
  }

  group.finish();
}

criterion_group!(benches, bench_process, bench_building_blocks);
criterion_main!(benches);
