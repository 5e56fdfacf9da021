// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Model visitor
//!
//! One method per node variant, dispatched by
//! [`ResolvedRowsSource::accept`]. There are no default methods: adding a
//! variant breaks every visitor until it handles the new case.
//!
//! CTE entries are not rows-source nodes of their own; visitors reach them
//! from [`visit_cte`](ModelVisitor::visit_cte) and call
//! [`visit_cte_subquery`](ModelVisitor::visit_cte_subquery) themselves.

use crate::model::{
    ResolvedCorrelated, ResolvedCrossJoin, ResolvedCte, ResolvedCteSubquery, ResolvedNaturalJoin,
    ResolvedProjection, ResolvedRowsSource, ResolvedSetCorrespondence, ResolvedTableData,
    ResolvedTableValue,
};

pub trait ModelVisitor {
    type Output;

    fn visit_table_data(
        &mut self,
        node: &ResolvedRowsSource,
        data: &ResolvedTableData,
    ) -> Self::Output;

    fn visit_table_value(
        &mut self,
        node: &ResolvedRowsSource,
        values: &ResolvedTableValue,
    ) -> Self::Output;

    fn visit_projection(
        &mut self,
        node: &ResolvedRowsSource,
        projection: &ResolvedProjection,
    ) -> Self::Output;

    fn visit_cross_join(
        &mut self,
        node: &ResolvedRowsSource,
        join: &ResolvedCrossJoin,
    ) -> Self::Output;

    fn visit_natural_join(
        &mut self,
        node: &ResolvedRowsSource,
        join: &ResolvedNaturalJoin,
    ) -> Self::Output;

    fn visit_set_correspondence(
        &mut self,
        node: &ResolvedRowsSource,
        set: &ResolvedSetCorrespondence,
    ) -> Self::Output;

    fn visit_cte(&mut self, node: &ResolvedRowsSource, cte: &ResolvedCte) -> Self::Output;

    fn visit_cte_subquery(&mut self, subquery: &ResolvedCteSubquery) -> Self::Output;

    fn visit_correlated(
        &mut self,
        node: &ResolvedRowsSource,
        correlated: &ResolvedCorrelated,
    ) -> Self::Output;
}
