use criterion::{criterion_group, criterion_main, Criterion};
use sift_regex::{CompileOptions, MatchOptions, Regex};

fn words(c: &mut Criterion) {
    let hay = b"the quick brown fox jumps over the lazy dog 0123 ".repeat(64);
    let re = Regex::new("[a-z]+").unwrap();
    c.bench_function("iterate_words", |b| {
        b.iter(|| {
            let mut count = 0;
            let mut m = re.find(&hay).unwrap();
            while m.matched() {
                count += 1;
                m.next().unwrap();
            }
            count
        })
    });

    let studied = Regex::with_options(
        "[a-z]+",
        CompileOptions::OPTIMIZE,
        MatchOptions::default(),
    )
    .unwrap();
    c.bench_function("iterate_words_studied", |b| {
        b.iter(|| {
            let mut count = 0;
            let mut m = studied.find(&hay).unwrap();
            while m.matched() {
                count += 1;
                m.next().unwrap();
            }
            count
        })
    });
}

fn replace(c: &mut Criterion) {
    let hay = b"alpha beta gamma delta ".repeat(64);
    let re = Regex::new(r"(\w+) (\w+)").unwrap();
    c.bench_function("replace_swap", |b| {
        b.iter(|| re.replace(&hay, r"\2 \1").unwrap())
    });
}

criterion_group!(benches, words, replace);
criterion_main!(benches);
