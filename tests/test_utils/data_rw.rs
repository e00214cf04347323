use small_heap_db::{
    operator::{collect_tuples, OpIterator, SeqScan},
    transaction::Transaction,
    Tuple,
};

use super::TestEnv;

/// Insert the rows in one transaction, then commit.
pub fn insert_rows(env: &TestEnv, table_id: u32, rows: &[Vec<i32>]) {
    let tx = Transaction::new();
    for row in rows {
        env.pool()
            .insert_tuple(&tx, table_id, &Tuple::from_ints(row))
            .unwrap();
    }
    tx.commit(env.pool()).unwrap();
}

/// Scan the whole table in a fresh transaction.
pub fn scan_all(env: &TestEnv, table_id: u32) -> Vec<Tuple> {
    let tx = Transaction::new();
    let mut scan = SeqScan::new(env.pool(), &tx, table_id, "t").unwrap();
    scan.open().unwrap();
    let tuples = collect_tuples(&mut scan).unwrap();
    scan.close();
    tx.commit(env.pool()).unwrap();
    tuples
}

/// Turn int tuples back into plain rows, for easy comparison.
pub fn int_rows(tuples: &[Tuple]) -> Vec<Vec<i32>> {
    tuples
        .iter()
        .map(|t| t.get_cells().iter().map(|c| c.get_int().unwrap()).collect())
        .collect()
}

pub fn rows(values: &[&[i32]]) -> Vec<Vec<i32>> {
    values.iter().map(|r| r.to_vec()).collect()
}
