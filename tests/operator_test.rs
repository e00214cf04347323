mod test_utils;

use small_heap_db::{
    operator::{
        collect_tuples, ChunkJoin, Delete, Filter, Insert, Join, JoinPredicate, OpIterator,
        OrderBy, SeqScan,
    },
    storage::{small_int_schema, Field, Type},
    transaction::Transaction,
    ErrorKind, Op, Predicate, Tuple, TupleScheme,
};
use test_utils::*;

fn run(op: &mut dyn OpIterator) -> Vec<Vec<i32>> {
    op.open().unwrap();
    let tuples = collect_tuples(op).unwrap();
    op.close();
    int_rows(&tuples)
}

#[test]
fn test_seq_scan_alias() {
    let env = setup();
    let scheme = TupleScheme::from_named(&[(Type::Int, "id"), (Type::String, "name")]);
    let table = new_table(&env, "people", &scheme);

    let tx = Transaction::new();
    let scan = SeqScan::new(env.pool(), &tx, table.get_id(), "p").unwrap();
    assert_eq!(scan.get_tuple_scheme().get_field_name(0), Some("p.id"));
    assert_eq!(scan.get_tuple_scheme().get_field_name(1), Some("p.name"));
    assert_eq!(scan.get_tuple_scheme(), &scheme);
    assert_eq!(scan.get_table_name().unwrap(), "people");

    let scan = SeqScan::with_table_name(env.pool(), &tx, table.get_id()).unwrap();
    assert_eq!(scan.get_tuple_scheme().get_field_name(0), Some("people.id"));
    tx.commit(env.pool()).unwrap();
}

#[test]
fn test_seq_scan_reset() {
    let env = setup();
    let a = new_int_table(&env, "a", 1);
    let b = new_int_table(&env, "b", 2);
    insert_rows(&env, a.get_id(), &rows(&[&[1], &[2]]));
    insert_rows(&env, b.get_id(), &rows(&[&[3, 4]]));

    let tx = Transaction::new();
    let mut scan = SeqScan::new(env.pool(), &tx, a.get_id(), "a").unwrap();
    assert_eq!(run(&mut scan), rows(&[&[1], &[2]]));

    scan.reset(b.get_id(), "b").unwrap();
    assert_eq!(scan.get_alias(), "b");
    assert_eq!(scan.get_tuple_scheme().fields_count(), 2);
    assert_eq!(run(&mut scan), rows(&[&[3, 4]]));
    tx.commit(env.pool()).unwrap();
}

#[test]
fn test_iterator_protocol() {
    let scheme = small_int_schema(1, "");
    let mut source = TupleSource::from_rows(&rows(&[&[1], &[2]]), &scheme);

    // not open yet
    assert!(source.has_next().is_err());
    assert_eq!(
        source.next().err().unwrap().kind(),
        ErrorKind::NoSuchElement
    );

    source.open().unwrap();
    assert!(source.has_next().unwrap());
    // has_next doesn't consume
    assert!(source.has_next().unwrap());
    assert_eq!(source.next().unwrap(), Tuple::from_ints(&[1]));
    assert_eq!(source.next().unwrap(), Tuple::from_ints(&[2]));
    assert!(!source.has_next().unwrap());
    assert_eq!(
        source.next().err().unwrap().kind(),
        ErrorKind::NoSuchElement
    );

    source.rewind().unwrap();
    assert_eq!(source.next().unwrap(), Tuple::from_ints(&[1]));

    source.close();
    assert!(source.next().is_err());
}

#[test]
fn test_filter() {
    let env = setup();
    let table = new_int_table(&env, "t", 2);
    insert_rows(
        &env,
        table.get_id(),
        &rows(&[&[1, 10], &[2, 20], &[3, 30], &[4, 40]]),
    );

    let tx = Transaction::new();
    let scan = SeqScan::new(env.pool(), &tx, table.get_id(), "t").unwrap();
    let predicate = Predicate::new(1, Op::GreaterThan, &Field::Int(20));
    let mut filter = Filter::new(predicate, Box::new(scan));
    assert_eq!(run(&mut filter), rows(&[&[3, 30], &[4, 40]]));

    // rewind replays the same tuples
    filter.open().unwrap();
    assert_eq!(filter.next().unwrap(), Tuple::from_ints(&[3, 30]));
    filter.rewind().unwrap();
    assert_eq!(
        int_rows(&collect_tuples(&mut filter).unwrap()),
        rows(&[&[3, 30], &[4, 40]])
    );
    filter.close();
    tx.commit(env.pool()).unwrap();
}

#[test]
fn test_filter_on_strings() {
    let scheme = TupleScheme::from_types(&[Type::String]);
    let tuples = ["apple", "banana", "grape"]
        .iter()
        .map(|s| Tuple::new(vec![Field::new_string(s)]))
        .collect();
    let source = Box::new(TupleSource::new(tuples, &scheme));

    let predicate = Predicate::new(0, Op::Like, &Field::new_string("ap"));
    let mut filter = Filter::new(predicate, source);
    filter.open().unwrap();
    let matched = collect_tuples(&mut filter).unwrap();
    assert_eq!(
        matched,
        vec![
            Tuple::new(vec![Field::new_string("apple")]),
            Tuple::new(vec![Field::new_string("grape")]),
        ]
    );
}

#[test]
fn test_join() {
    let scheme = small_int_schema(2, "");
    let left = TupleSource::from_rows(&rows(&[&[1, 10], &[2, 20], &[3, 30]]), &scheme);
    let right = TupleSource::from_rows(&rows(&[&[2, 200], &[1, 100], &[2, 201]]), &scheme);

    let mut join = Join::new(JoinPredicate::new(0, Op::Equals, 0), left, right);
    assert_eq!(join.get_tuple_scheme().fields_count(), 4);
    assert_eq!(
        run(&mut join),
        rows(&[&[1, 10, 1, 100], &[2, 20, 2, 200], &[2, 20, 2, 201]])
    );
}

#[test]
fn test_join_tables() {
    let env = setup();
    let a = new_int_table(&env, "a", 2);
    let b = new_int_table(&env, "b", 2);
    insert_rows(&env, a.get_id(), &rows(&[&[1, 5], &[2, 6], &[3, 7]]));
    insert_rows(&env, b.get_id(), &rows(&[&[6, 0], &[7, 1], &[8, 2]]));

    let tx = Transaction::new();
    let left = SeqScan::new(env.pool(), &tx, a.get_id(), "a").unwrap();
    let right = SeqScan::new(env.pool(), &tx, b.get_id(), "b").unwrap();
    let mut join = Join::new(
        JoinPredicate::new(1, Op::LessThan, 0),
        Box::new(left),
        Box::new(right),
    );
    assert_eq!(join.get_left_field_name(), Some("a.a-1"));
    assert_eq!(join.get_right_field_name(), Some("b.b-0"));
    assert_eq!(
        run(&mut join),
        rows(&[
            &[1, 5, 6, 0],
            &[1, 5, 7, 1],
            &[1, 5, 8, 2],
            &[2, 6, 7, 1],
            &[2, 6, 8, 2],
            &[3, 7, 8, 2],
        ])
    );
    tx.commit(env.pool()).unwrap();
}

#[test]
fn test_chunk_join_matches_join() {
    let scheme = small_int_schema(2, "");
    let left_rows: Vec<Vec<i32>> = (0..10).map(|i| vec![i % 4, i]).collect();
    let right_rows: Vec<Vec<i32>> = (0..6).map(|i| vec![i % 3, 100 + i]).collect();

    let mut join = Join::new(
        JoinPredicate::new(0, Op::Equals, 0),
        TupleSource::from_rows(&left_rows, &scheme),
        TupleSource::from_rows(&right_rows, &scheme),
    );
    let mut expect = run(&mut join);
    expect.sort();

    for chunk_size in &[1, 3, 10, 64] {
        let mut chunk_join = ChunkJoin::new(
            JoinPredicate::new(0, Op::Equals, 0),
            TupleSource::from_rows(&left_rows, &scheme),
            TupleSource::from_rows(&right_rows, &scheme),
            *chunk_size,
        )
        .unwrap();
        let mut actual = run(&mut chunk_join);
        actual.sort();
        assert_eq!(actual, expect, "chunk size: {}", chunk_size);
    }

    assert!(ChunkJoin::new(
        JoinPredicate::new(0, Op::Equals, 0),
        TupleSource::from_rows(&left_rows, &scheme),
        TupleSource::from_rows(&right_rows, &scheme),
        0,
    )
    .is_err());
}

#[test]
fn test_order_by() {
    let scheme = small_int_schema(2, "");
    let source = TupleSource::from_rows(&rows(&[&[3, 0], &[1, 1], &[2, 2], &[1, 3]]), &scheme);
    let mut asc = OrderBy::new(0, true, source);
    // stable: (1, 1) stays before (1, 3)
    assert_eq!(run(&mut asc), rows(&[&[1, 1], &[1, 3], &[2, 2], &[3, 0]]));

    let source = TupleSource::from_rows(&rows(&[&[3, 0], &[1, 1], &[2, 2], &[1, 3]]), &scheme);
    let mut desc = OrderBy::new(0, false, source);
    assert_eq!(run(&mut desc), rows(&[&[3, 0], &[2, 2], &[1, 1], &[1, 3]]));
}

#[test]
fn test_insert() {
    let env = setup();
    let table = new_int_table(&env, "t", 2);
    let scheme = table.get_scheme().clone();

    let tx = Transaction::new();
    let source = TupleSource::from_rows(&rows(&[&[1, 1], &[2, 2], &[3, 3]]), &scheme);
    let mut insert = Insert::new(env.pool(), &tx, source, table.get_id()).unwrap();
    insert.open().unwrap();
    assert_eq!(insert.next().unwrap(), Tuple::from_ints(&[3]));
    assert!(!insert.has_next().unwrap());

    // rewind replays the count, the tuples are not inserted again
    insert.rewind().unwrap();
    assert_eq!(insert.next().unwrap(), Tuple::from_ints(&[3]));
    insert.close();
    tx.commit(env.pool()).unwrap();

    assert_eq!(
        int_rows(&scan_all(&env, table.get_id())),
        rows(&[&[1, 1], &[2, 2], &[3, 3]])
    );
}

#[test]
fn test_insert_scheme_mismatch() {
    let env = setup();
    let table = new_int_table(&env, "t", 2);

    let tx = Transaction::new();
    let source = TupleSource::from_rows(&rows(&[&[1]]), &small_int_schema(1, ""));
    let err = Insert::new(env.pool(), &tx, source, table.get_id())
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Db);
    tx.commit(env.pool()).unwrap();
}

/// Delete over a child producing 3 tuples returns (3), and a later scan
/// finds none of them.
#[test]
fn test_delete() {
    let env = setup();
    let table = new_int_table(&env, "t", 2);
    insert_rows(
        &env,
        table.get_id(),
        &rows(&[&[1, 1], &[2, 2], &[3, 3], &[4, 4], &[5, 5]]),
    );

    let tx = Transaction::new();
    let scan = SeqScan::new(env.pool(), &tx, table.get_id(), "t").unwrap();
    let filter = Filter::new(
        Predicate::new(0, Op::LessThanOrEq, &Field::Int(3)),
        Box::new(scan),
    );
    let mut delete = Delete::new(env.pool(), &tx, Box::new(filter));
    delete.open().unwrap();
    assert_eq!(delete.next().unwrap(), Tuple::from_ints(&[3]));
    assert!(!delete.has_next().unwrap());
    delete.rewind().unwrap();
    assert_eq!(delete.next().unwrap(), Tuple::from_ints(&[3]));
    delete.close();
    tx.commit(env.pool()).unwrap();

    assert_eq!(
        int_rows(&scan_all(&env, table.get_id())),
        rows(&[&[4, 4], &[5, 5]])
    );
}

#[test]
fn test_children() {
    let scheme = small_int_schema(1, "");
    let mut filter = Filter::new(
        Predicate::new(0, Op::Equals, &Field::Int(2)),
        TupleSource::from_rows(&rows(&[&[1], &[2]]), &scheme),
    );
    assert_eq!(filter.get_children().len(), 1);

    filter
        .set_children(vec![TupleSource::from_rows(&rows(&[&[2], &[2]]), &scheme)])
        .unwrap();
    assert_eq!(run(&mut filter), rows(&[&[2], &[2]]));

    assert!(filter.set_children(Vec::new()).is_err());

    let mut join = Join::new(
        JoinPredicate::new(0, Op::Equals, 0),
        TupleSource::from_rows(&rows(&[&[1]]), &scheme),
        TupleSource::from_rows(&rows(&[&[1]]), &scheme),
    );
    join.set_children(vec![
        TupleSource::from_rows(&rows(&[&[5]]), &scheme),
        TupleSource::from_rows(&rows(&[&[5], &[6]]), &scheme),
    ])
    .unwrap();
    assert_eq!(join.get_children().len(), 2);
    assert_eq!(run(&mut join), rows(&[&[5, 5]]));
}
