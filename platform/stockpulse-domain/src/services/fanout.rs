use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

pub fn normalize_parallelism(value: Option<usize>) -> usize {
    value.unwrap_or(1).max(1)
}

/// Runs `task` for every item on at most `parallelism` scoped worker threads.
///
/// Results come back in input order. Tasks are independent: a task reports its own failure
/// through `R` (typically a `Result`) and never stops its siblings.
pub fn fan_out<T, R, F>(items: &[T], parallelism: usize, task: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let worker_count = parallelism.max(1).min(items.len());
    if worker_count <= 1 {
        return items.iter().map(&task).collect();
    }

    let next_index = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<(usize, R)>();

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            let tx = tx.clone();
            let next_index_ref = &next_index;
            let task_ref = &task;
            scope.spawn(move || loop {
                let idx = next_index_ref.fetch_add(1, Ordering::Relaxed);
                if idx >= items.len() {
                    break;
                }
                if tx.send((idx, task_ref(&items[idx]))).is_err() {
                    break;
                }
            });
        }

        drop(tx);

        let mut indexed: Vec<(usize, R)> = rx.iter().collect();
        indexed.sort_by_key(|(idx, _)| *idx);
        indexed.into_iter().map(|(_, result)| result).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::{fan_out, normalize_parallelism};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn normalize_parallelism_guards_invalid_values() {
        assert_eq!(normalize_parallelism(None), 1);
        assert_eq!(normalize_parallelism(Some(0)), 1);
        assert_eq!(normalize_parallelism(Some(4)), 4);
    }

    #[test]
    fn preserves_input_order() {
        let items: Vec<u64> = (0..20).collect();
        let out = fan_out(&items, 4, |n| {
            std::thread::sleep(Duration::from_millis(20 - n));
            n * 2
        });
        assert_eq!(out, items.iter().map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn failures_do_not_cancel_siblings() {
        let items = vec!["ok", "bad", "ok", "ok"];
        let out: Vec<Result<&str, String>> = fan_out(&items, 3, |item| {
            if *item == "bad" {
                Err("boom".to_string())
            } else {
                Ok(*item)
            }
        });
        assert_eq!(out.len(), 4);
        assert!(out[1].is_err());
        assert_eq!(out.iter().filter(|r| r.is_ok()).count(), 3);
    }

    #[test]
    fn runs_concurrently_up_to_the_bound() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let items: Vec<usize> = (0..8).collect();
        fan_out(&items, 3, |_| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak > 1, "expected concurrent execution, peak={peak}");
        assert!(peak <= 3, "worker bound exceeded, peak={peak}");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let items: Vec<u8> = Vec::new();
        let out: Vec<u8> = fan_out(&items, 8, |b| *b);
        assert!(out.is_empty());
    }
}
