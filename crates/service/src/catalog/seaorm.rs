use chrono::Utc;
use sea_orm::sea_query::{extension::postgres::PgExpr, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use models::{control, framework, regulator};

use super::repository::{CatalogRepository, ControlCriteria};
use crate::errors::ServiceError;

pub struct SeaOrmCatalogRepository {
    pub db: DatabaseConnection,
}

/// `%term%` with LIKE metacharacters escaped, so user input only ever matches literally.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[async_trait::async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn regulator_by_code(&self, code: &str) -> Result<Option<regulator::Model>, ServiceError> {
        Ok(regulator::Entity::find().filter(regulator::Column::Code.eq(code)).one(&self.db).await?)
    }

    async fn insert_regulator(&self, row: regulator::Model) -> Result<regulator::Model, ServiceError> {
        Ok(row.into_active_model().reset_all().insert(&self.db).await?)
    }

    async fn update_regulator(&self, row: regulator::Model) -> Result<regulator::Model, ServiceError> {
        Ok(row.into_active_model().reset_all().update(&self.db).await?)
    }

    async fn active_regulators(&self, region_type: Option<&str>) -> Result<Vec<regulator::Model>, ServiceError> {
        let mut q = regulator::Entity::find().filter(regulator::Column::IsActive.eq(true));
        if let Some(r) = region_type {
            q = q.filter(regulator::Column::RegionType.eq(r));
        }
        Ok(q.order_by_asc(regulator::Column::Code).all(&self.db).await?)
    }

    async fn framework_by_code(&self, code: &str) -> Result<Option<framework::Model>, ServiceError> {
        Ok(framework::Entity::find().filter(framework::Column::Code.eq(code)).one(&self.db).await?)
    }

    async fn insert_framework(&self, row: framework::Model) -> Result<framework::Model, ServiceError> {
        Ok(row.into_active_model().reset_all().insert(&self.db).await?)
    }

    async fn active_frameworks(
        &self,
        regulator_id: Option<Uuid>,
        mandatory: Option<bool>,
    ) -> Result<Vec<framework::Model>, ServiceError> {
        let mut q = framework::Entity::find().filter(framework::Column::IsActive.eq(true));
        if let Some(id) = regulator_id {
            q = q.filter(framework::Column::RegulatorId.eq(id));
        }
        if let Some(m) = mandatory {
            q = q.filter(framework::Column::IsMandatory.eq(m));
        }
        Ok(q.order_by_asc(framework::Column::Code).all(&self.db).await?)
    }

    async fn control_number_taken(&self, framework_id: Uuid, number: &str) -> Result<bool, ServiceError> {
        let n = control::Entity::find()
            .filter(control::Column::FrameworkId.eq(framework_id))
            .filter(control::Column::ControlNumber.eq(number))
            .count(&self.db)
            .await?;
        Ok(n > 0)
    }

    async fn insert_control(&self, row: control::Model) -> Result<control::Model, ServiceError> {
        let framework_id = row.framework_id;
        let txn = self.db.begin().await?;
        let created = row.into_active_model().reset_all().insert(&txn).await?;
        framework::Entity::update_many()
            .col_expr(framework::Column::ControlCount, Expr::col(framework::Column::ControlCount).add(1))
            .col_expr(framework::Column::UpdatedAt, Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())))
            .filter(framework::Column::Id.eq(framework_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(created)
    }

    async fn control_page(
        &self,
        criteria: &ControlCriteria,
        page_idx: u64,
        per_page: u64,
    ) -> Result<(Vec<control::Model>, u64), ServiceError> {
        let mut q = control::Entity::find().filter(control::Column::IsActive.eq(true));
        if let Some(id) = criteria.framework_id {
            q = q.filter(control::Column::FrameworkId.eq(id));
        }
        if let Some(domain) = criteria.domain.as_deref() {
            q = q.filter(Expr::col(control::Column::Domain).ilike(contains_pattern(domain)));
        }
        if let Some(t) = criteria.control_type.as_deref() {
            q = q.filter(control::Column::ControlType.eq(t));
        }
        if let Some(m) = criteria.maturity_level {
            q = q.filter(control::Column::MaturityLevel.eq(m));
        }
        let paginator = q
            .order_by_asc(control::Column::DisplayOrder)
            .order_by_asc(control::Column::ControlNumber)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page_idx).await?;
        Ok((items, total))
    }

    async fn active_control(&self, id: Uuid) -> Result<Option<control::Model>, ServiceError> {
        Ok(control::Entity::find_by_id(id)
            .filter(control::Column::IsActive.eq(true))
            .one(&self.db)
            .await?)
    }

    async fn search_controls(&self, term: &str, limit: u64) -> Result<Vec<control::Model>, ServiceError> {
        let pattern = contains_pattern(term);
        let any = Condition::any()
            .add(Expr::col(control::Column::ControlNumber).ilike(pattern.clone()))
            .add(Expr::col(control::Column::Title).ilike(pattern.clone()))
            .add(Expr::col(control::Column::Domain).ilike(pattern.clone()))
            .add(Expr::col(control::Column::Requirement).ilike(pattern));
        Ok(control::Entity::find()
            .filter(control::Column::IsActive.eq(true))
            .filter(any)
            .order_by_asc(control::Column::DisplayOrder)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    async fn count_active_controls(&self) -> Result<u64, ServiceError> {
        Ok(control::Entity::find().filter(control::Column::IsActive.eq(true)).count(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogService, NewControl, NewFramework, NewRegulator};
    use crate::test_support::get_db;
    use common::pagination::Pagination;
    use std::sync::Arc;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(contains_pattern("ECC"), "%ECC%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[tokio::test]
    async fn catalog_hierarchy_against_postgres() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let svc = CatalogService::new(Arc::new(SeaOrmCatalogRepository { db: db.clone() }));
        let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();

        let r = svc
            .create_regulator(NewRegulator { code: format!("t{suffix}"), name: "Test Authority".into(), description: None, website: None })
            .await?;
        assert_eq!(r.code, format!("T{suffix}"));
        let f = svc
            .create_framework(NewFramework {
                regulator_code: r.code.clone(),
                code: format!("FW{suffix}"),
                title: "Essential Controls".into(),
                version: "2.0".into(),
                is_mandatory: true,
            })
            .await?;

        let new_control = |number: &str| NewControl {
            framework_code: f.code.clone(),
            control_number: number.into(),
            domain: "Cybersecurity Governance".into(),
            title: format!("Control {number}"),
            requirement: "Define and approve a policy".into(),
            control_type: "Preventive".into(),
            maturity_level: 2,
            evidence_requirements: None,
            display_order: 1,
        };
        svc.create_control(new_control("1-1-1")).await?;
        svc.create_control(new_control("1-1-2")).await?;
        assert_eq!(svc.get_framework_by_code(&f.code).await?.control_count, 2);

        let filter = crate::catalog::ControlFilter { framework_code: Some(f.code.clone()), domain: Some("governance".into()), ..Default::default() };
        let page = svc.list_controls(&filter, Pagination { page: 1, per_page: 1 }).await?;
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);

        framework::Entity::delete_by_id(f.id).exec(&db).await?;
        regulator::Entity::delete_by_id(r.id).exec(&db).await?;
        Ok(())
    }
}
