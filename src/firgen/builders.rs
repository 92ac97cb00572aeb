//! Per-operator logic builders.
//!
//! Each builder emits the statements realizing one elastic component against the extracted
//! port subfields. Ports are ordered operands first, results last; a statement vector
//! becomes the body of the component's sub-module.

use crate::fir::{self, Expression, PrimOp, Statement};

use super::{Channel, FirgenError};

/// Builds a literal of the given ground type.
fn typed_literal(tpe: &fir::Type, value: u64) -> Option<Expression> {
    match tpe {
        fir::Type::UInt(width) => Some(Expression::uint(*width, value)),
        fir::Type::SInt(width) => Some(Expression::sint(*width, value)),
        _ => None,
    }
}

/// Joins two operand channels into one result channel through a primitive operator.
///
/// Both operands are consumed exactly when the joined token is accepted by the consumer.
pub(super) fn binary(op: PrimOp, name: &str, ports: &[Channel]) -> Result<Vec<Statement>, FirgenError> {
    let (lhs, rhs, result) = (&ports[0], &ports[1], &ports[2]);

    let mut stmts = vec![Statement::connect(
        result.data_expr(name)?.clone(),
        Expression::do_prim(op, vec![lhs.data_expr(name)?.clone(), rhs.data_expr(name)?.clone()]),
    )];

    stmts.push(Statement::def_node(
        "result_valid",
        Expression::and(lhs.valid.clone(), rhs.valid.clone()),
    ));
    stmts.push(Statement::connect(result.valid.clone(), Expression::reference("result_valid")));

    stmts.push(Statement::def_node(
        "args_ready",
        Expression::and(result.ready.clone(), Expression::reference("result_valid")),
    ));
    stmts.push(Statement::connect(lhs.ready.clone(), Expression::reference("args_ready")));
    stmts.push(Statement::connect(rhs.ready.clone(), Expression::reference("args_ready")));

    Ok(stmts)
}

/// A sink is always ready; the token and its payload are dropped.
pub(super) fn sink(ports: &[Channel]) -> Vec<Statement> {
    vec![Statement::connect(ports[0].ready.clone(), Expression::uint(1, 1))]
}

/// Joins control tokens: the output is offered only after every input token has arrived.
pub(super) fn join(ports: &[Channel]) -> Vec<Statement> {
    let (args, result) = ports.split_at(ports.len() - 1);
    let result = &result[0];

    let all_valid =
        args.iter().skip(1).fold(args[0].valid.clone(), |acc, arg| Expression::and(arg.valid.clone(), acc));
    let mut stmts = vec![Statement::def_node("all_valid", all_valid)];
    stmts.push(Statement::connect(result.valid.clone(), Expression::reference("all_valid")));

    stmts.push(Statement::def_node(
        "args_ready",
        Expression::and(result.ready.clone(), Expression::reference("all_valid")),
    ));
    for arg in args {
        stmts.push(Statement::connect(arg.ready.clone(), Expression::reference("args_ready")));
    }

    stmts
}

/// Routes the selected data input to the result. The mux is silent while the selector is
/// invalid; the selector token is consumed when the routed token transfers.
///
/// Selector values index the operand list, in which the selector itself is operand 0.
pub(super) fn mux(ports: &[Channel]) -> Result<Vec<Statement>, FirgenError> {
    let select = &ports[0];
    let result = &ports[ports.len() - 1];
    let inputs = &ports[1..ports.len() - 1];

    let (select_data, select_tpe) = select
        .data
        .as_ref()
        .ok_or_else(|| FirgenError::malformed("mux", "selector channel carries no data"))?;

    let mut chain = Statement::Empty;
    for (i, input) in inputs.iter().enumerate().rev() {
        let mut body = vec![Statement::connect(result.valid.clone(), input.valid.clone())];
        if let (Some((input_data, _)), Some((result_data, _))) = (&input.data, &result.data) {
            body.push(Statement::connect(result_data.clone(), input_data.clone()));
        }
        body.push(Statement::connect(input.ready.clone(), result.ready.clone()));
        body.push(Statement::connect(
            select.ready.clone(),
            Expression::and(input.valid.clone(), result.ready.clone()),
        ));

        let index = typed_literal(select_tpe, (i + 1) as u64)
            .ok_or_else(|| FirgenError::malformed("mux", "selector data is not an integer"))?;
        let cond = Expression::do_prim(PrimOp::Eq, vec![select_data.clone(), index]);
        chain = if matches!(chain, Statement::Empty) {
            Statement::when(cond, body)
        } else {
            Statement::when_else(cond, body, vec![chain])
        };
    }

    Ok(vec![Statement::when(select.valid.clone(), vec![chain])])
}

/// Connects the first valid input to the result; lower-indexed inputs take priority when
/// several offer a token at once.
pub(super) fn merge(ports: &[Channel]) -> Vec<Statement> {
    let (inputs, result) = ports.split_at(ports.len() - 1);
    let result = &result[0];

    let mut chain = Statement::Empty;
    for input in inputs.iter().rev() {
        let mut body = Vec::new();
        if let (Some((input_data, _)), Some((result_data, _))) = (&input.data, &result.data) {
            body.push(Statement::connect(result_data.clone(), input_data.clone()));
        }
        body.push(Statement::connect(result.valid.clone(), input.valid.clone()));
        body.push(Statement::connect(input.ready.clone(), result.ready.clone()));

        chain = if matches!(chain, Statement::Empty) {
            Statement::when(input.valid.clone(), body)
        } else {
            Statement::when_else(input.valid.clone(), body, vec![chain])
        };
    }

    match chain {
        Statement::Empty => Vec::new(),
        chain => vec![chain],
    }
}

/// Prioritized merge that additionally reports the index of the chosen input. The chosen
/// input token is consumed only once both the primary and the index result accept.
pub(super) fn control_merge(control: bool, ports: &[Channel]) -> Result<Vec<Statement>, FirgenError> {
    let num_ports = ports.len();
    let inputs = &ports[..num_ports - 2];
    let result = &ports[num_ports - 2];
    let index = &ports[num_ports - 1];

    let (index_data, index_tpe) = index
        .data
        .as_ref()
        .ok_or_else(|| FirgenError::malformed("control_merge", "index channel carries no data"))?;

    let mut stmts = vec![Statement::def_node(
        "args_ready",
        Expression::and(result.ready.clone(), index.ready.clone()),
    )];

    let mut chain = Statement::Empty;
    for (i, input) in inputs.iter().enumerate().rev() {
        let literal = typed_literal(index_tpe, i as u64)
            .ok_or_else(|| FirgenError::malformed("control_merge", "index data is not an integer"))?;
        let mut body = vec![
            Statement::connect(index_data.clone(), literal),
            Statement::connect(index.valid.clone(), input.valid.clone()),
            Statement::connect(result.valid.clone(), input.valid.clone()),
            Statement::connect(input.ready.clone(), Expression::reference("args_ready")),
        ];
        if !control {
            if let (Some((input_data, _)), Some((result_data, _))) = (&input.data, &result.data) {
                body.push(Statement::connect(result_data.clone(), input_data.clone()));
            }
        }

        chain = if matches!(chain, Statement::Empty) {
            Statement::when(input.valid.clone(), body)
        } else {
            Statement::when_else(input.valid.clone(), body, vec![chain])
        };
    }
    if !matches!(chain, Statement::Empty) {
        stmts.push(chain);
    }

    Ok(stmts)
}

/// Passes its channel through unchanged.
pub(super) fn branch(control: bool, ports: &[Channel]) -> Vec<Statement> {
    let (arg, result) = (&ports[0], &ports[1]);

    let mut stmts = vec![
        Statement::connect(result.valid.clone(), arg.valid.clone()),
        Statement::connect(arg.ready.clone(), result.ready.clone()),
    ];
    if !control {
        if let (Some((arg_data, _)), Some((result_data, _))) = (&arg.data, &result.data) {
            stmts.push(Statement::connect(result_data.clone(), arg_data.clone()));
        }
    }

    stmts
}

/// Routes the data channel to the first result when the selector holds a true token, to
/// the second otherwise. Silent while the selector is invalid.
pub(super) fn cond_branch(control: bool, ports: &[Channel]) -> Result<Vec<Statement>, FirgenError> {
    let (selector, arg) = (&ports[0], &ports[1]);

    let (selector_data, _) = selector
        .data
        .as_ref()
        .ok_or_else(|| FirgenError::malformed("cond_br", "selector channel carries no data"))?;

    let arm = |result: &Channel| {
        let mut body = vec![
            Statement::connect(result.valid.clone(), arg.valid.clone()),
            Statement::connect(arg.ready.clone(), result.ready.clone()),
        ];
        if !control {
            if let (Some((arg_data, _)), Some((result_data, _))) = (&arg.data, &result.data) {
                body.push(Statement::connect(result_data.clone(), arg_data.clone()));
            }
        }
        body.push(Statement::connect(
            selector.ready.clone(),
            Expression::and(arg.valid.clone(), result.ready.clone()),
        ));
        body
    };

    Ok(vec![Statement::when(
        selector.valid.clone(),
        vec![Statement::when_else(selector_data.clone(), arm(&ports[2]), arm(&ports[3]))],
    )])
}

/// Replicates one token to every result channel. Both fork kinds lower lazily: the input
/// token transfers only once every consumer is ready to accept it.
pub(super) fn fork(control: bool, ports: &[Channel]) -> Vec<Statement> {
    let (arg, results) = (&ports[0], &ports[1..]);

    let all_ready =
        results.iter().skip(1).fold(results[0].ready.clone(), |acc, result| Expression::and(result.ready.clone(), acc));
    let mut stmts = vec![Statement::def_node("all_ready", all_ready)];
    stmts.push(Statement::connect(arg.ready.clone(), Expression::reference("all_ready")));

    stmts.push(Statement::def_node(
        "result_valid",
        Expression::and(arg.valid.clone(), Expression::reference("all_ready")),
    ));
    for result in results {
        stmts.push(Statement::connect(result.valid.clone(), Expression::reference("result_valid")));
        if !control {
            if let (Some((arg_data, _)), Some((result_data, _))) = (&arg.data, &result.data) {
                stmts.push(Statement::connect(result_data.clone(), arg_data.clone()));
            }
        }
    }

    stmts
}

/// Emits the literal each time the trigger channel fires.
pub(super) fn constant(value: u64, ports: &[Channel]) -> Result<Vec<Statement>, FirgenError> {
    let (trigger, result) = (&ports[0], &ports[1]);

    let (result_data, result_tpe) = result
        .data
        .as_ref()
        .ok_or_else(|| FirgenError::malformed("constant", "result channel carries no data"))?;
    let literal = typed_literal(result_tpe, value)
        .ok_or_else(|| FirgenError::malformed("constant", "result data is not an integer"))?;

    Ok(vec![
        Statement::connect(result.valid.clone(), trigger.valid.clone()),
        Statement::connect(trigger.ready.clone(), result.ready.clone()),
        Statement::connect(result_data.clone(), literal),
    ])
}

/// Elastic buffer.
pub(super) fn buffer(_ports: &[Channel]) -> Vec<Statement> {
    // TODO: Wire a slot-count-deep elastic FIFO between the two channels.
    Vec::new()
}
