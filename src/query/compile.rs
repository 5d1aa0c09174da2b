use bson::{Bson, Document, doc};

use super::types::{AndGroup, CompiledQuery, Condition, Filter, NativeOptions, Operator, Request, SortSpec};

/// Translate a request's filter and directives into a native query.
///
/// Pure and total: unknown operators are skipped, and absent or zero-valued
/// `limit`/`page` simply produce no paging clauses.
#[must_use]
pub fn compile(request: &Request) -> CompiledQuery {
    compile_parts(
        request.filter.as_ref(),
        request.attributes.as_deref(),
        request.limit,
        request.page,
        request.order.as_deref(),
        request.search.as_deref(),
    )
}

#[must_use]
pub fn compile_parts(
    filter: Option<&Filter>,
    attributes: Option<&[String]>,
    limit: Option<u64>,
    page: Option<u64>,
    order: Option<&[SortSpec]>,
    search: Option<&str>,
) -> CompiledQuery {
    let mut query = filter.map(build_query).unwrap_or_default();
    if let Some(text) = search.filter(|s| !s.is_empty()) {
        query.insert("$text", doc! { "$search": text });
    }
    CompiledQuery { filter: query, options: build_options(attributes, limit, page, order) }
}

/// Reduce a disjunction of AND-groups to a native filter document.
///
/// A single group or a single condition is emitted bare; otherwise `$or` / `$and`
/// wrap the branches in their given order.
#[must_use]
pub fn build_query(filter: &Filter) -> Document {
    let mut branches: Vec<Document> = filter.iter().map(build_and_group).collect();
    match branches.len() {
        0 => Document::new(),
        1 => branches.remove(0),
        _ => doc! { "$or": branches },
    }
}

fn build_and_group(group: &AndGroup) -> Document {
    let mut predicates: Vec<Document> = group.iter().filter_map(translate_condition).collect();
    match predicates.len() {
        1 => predicates.remove(0),
        // the server rejects an empty $and; {} keeps the match-all meaning
        0 => doc! { "$and": [Document::new()] },
        _ => doc! { "$and": predicates },
    }
}

/// Native predicate for one condition, or `None` for an unrecognized operator.
#[must_use]
pub fn translate_condition(condition: &Condition) -> Option<Document> {
    let Condition { attribute, operator, value } = condition;
    let predicate: Bson = match operator {
        Operator::Equal => match value {
            Bson::Array(values) => doc! { "$in": values.clone() }.into(),
            Bson::Document(sub) => doc! { "$elemMatch": sub.clone() }.into(),
            other => other.clone(),
        },
        Operator::NotEqual => match value {
            Bson::Array(values) => doc! { "$nin": values.clone() }.into(),
            Bson::Document(sub) => doc! { "$not": { "$elemMatch": sub.clone() } }.into(),
            other => doc! { "$ne": other.clone() }.into(),
        },
        Operator::Greater => doc! { "$gt": value.clone() }.into(),
        Operator::GreaterOrEqual => doc! { "$gte": value.clone() }.into(),
        Operator::Less => doc! { "$lt": value.clone() }.into(),
        Operator::LessOrEqual => doc! { "$lte": value.clone() }.into(),
        Operator::Unrecognized => {
            log::debug!(target: "docbridge::query", "skipping condition on {attribute}: unrecognized operator");
            return None;
        }
    };
    let mut out = Document::new();
    out.insert(attribute.clone(), predicate);
    Some(out)
}

fn build_options(
    attributes: Option<&[String]>,
    limit: Option<u64>,
    page: Option<u64>,
    order: Option<&[SortSpec]>,
) -> NativeOptions {
    let limit = limit.filter(|l| *l > 0);
    let projection = attributes.map(|attrs| {
        let mut p = Document::new();
        for a in attrs {
            p.insert(a.clone(), 1);
        }
        p
    });
    let skip = match (limit, page) {
        (Some(l), Some(p)) if p > 1 => Some(l.saturating_mul(p - 1)),
        _ => None,
    };
    let sort = order.map(|specs| {
        specs.iter().map(|s| (s.attribute.clone(), s.direction.weight())).collect()
    });
    NativeOptions {
        projection,
        limit: limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX)),
        skip,
        sort,
    }
}
