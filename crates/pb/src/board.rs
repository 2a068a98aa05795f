//! Client-side board move planning.
//!
//! Reordering is computed here, not on the server: a move produces one
//! position write per task left in the affected column(s), with contiguous
//! zero-based positions matching the new visual order. A cross-column move
//! additionally carries the destination status on the moved task's write.

use db::{models::task::Task, types::TaskStatus};
use uuid::Uuid;

/// One pending `PUT /api/tasks/{id}` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionWrite {
    pub task: Uuid,
    pub position: i32,
    pub status: Option<TaskStatus>,
}

/// Tasks of one column in visual order: position ascending, then newest
/// first, same as the server's listing order.
pub fn sorted_column(tasks: &[Task], status: TaskStatus) -> Vec<Uuid> {
    let mut column: Vec<&Task> = tasks.iter().filter(|task| task.status == status).collect();
    column.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then(b.created_at.cmp(&a.created_at))
    });
    column.into_iter().map(|task| task.id).collect()
}

pub fn plan_same_column_move(column: &[Uuid], from: usize, to: usize) -> Vec<PositionWrite> {
    let mut order = column.to_vec();
    let moved = order.remove(from);
    let to = to.min(order.len());
    order.insert(to, moved);

    order
        .iter()
        .enumerate()
        .map(|(index, &task)| PositionWrite {
            task,
            position: index as i32,
            status: None,
        })
        .collect()
}

pub fn plan_cross_column_move(
    source: &[Uuid],
    dest: &[Uuid],
    from: usize,
    to: usize,
    dest_status: TaskStatus,
) -> Vec<PositionWrite> {
    let mut new_source = source.to_vec();
    let moved = new_source.remove(from);
    let mut new_dest = dest.to_vec();
    let to = to.min(new_dest.len());
    new_dest.insert(to, moved);

    let mut writes: Vec<PositionWrite> = new_source
        .iter()
        .enumerate()
        .map(|(index, &task)| PositionWrite {
            task,
            position: index as i32,
            status: None,
        })
        .collect();
    writes.extend(new_dest.iter().enumerate().map(|(index, &task)| {
        PositionWrite {
            task,
            position: index as i32,
            status: (task == moved).then_some(dest_status),
        }
    }));
    writes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn same_column_move_yields_contiguous_zero_based_positions() {
        let column = ids(4);
        let writes = plan_same_column_move(&column, 3, 0);

        // Every task in the column gets exactly one write.
        assert_eq!(writes.len(), 4);
        let positions: Vec<i32> = writes.iter().map(|w| w.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert!(writes.iter().all(|w| w.status.is_none()));

        // The moved task leads, the rest keep their relative order.
        let order: Vec<Uuid> = writes.iter().map(|w| w.task).collect();
        assert_eq!(order, vec![column[3], column[0], column[1], column[2]]);
    }

    #[test]
    fn same_column_move_clamps_target_index() {
        let column = ids(2);
        let writes = plan_same_column_move(&column, 0, 99);
        let order: Vec<Uuid> = writes.iter().map(|w| w.task).collect();
        assert_eq!(order, vec![column[1], column[0]]);
    }

    #[test]
    fn cross_column_move_rewrites_both_columns_and_sets_status() {
        let source = ids(3);
        let dest = ids(2);
        let writes = plan_cross_column_move(&source, &dest, 1, 1, TaskStatus::Done);

        // Two writes for the shrunken source, three for the grown dest.
        assert_eq!(writes.len(), 5);

        let source_writes = &writes[..2];
        assert_eq!(
            source_writes
                .iter()
                .map(|w| (w.task, w.position))
                .collect::<Vec<_>>(),
            vec![(source[0], 0), (source[2], 1)]
        );

        let dest_writes = &writes[2..];
        assert_eq!(
            dest_writes.iter().map(|w| w.task).collect::<Vec<_>>(),
            vec![dest[0], source[1], dest[1]]
        );
        assert_eq!(
            dest_writes.iter().map(|w| w.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        // Only the moved task changes status.
        assert_eq!(dest_writes[1].status, Some(TaskStatus::Done));
        assert!(dest_writes[0].status.is_none());
        assert!(dest_writes[2].status.is_none());
        assert!(source_writes.iter().all(|w| w.status.is_none()));
    }

    #[test]
    fn moving_into_an_empty_column_works() {
        let source = ids(1);
        let writes = plan_cross_column_move(&source, &[], 0, 0, TaskStatus::InProgress);
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].position, 0);
        assert_eq!(writes[0].status, Some(TaskStatus::InProgress));
    }
}
