use chrono::Utc;
use diesel::prelude::*;
use std::collections::HashSet;
use uuid::Uuid;

use super::types::{ContentKind, ItemRef, ReorderRequest};
use crate::core::shared::schema::{assignments, course_modules, lessons, quizzes};
use crate::core::shared::{ApiError, ApiResult};

/// What currently belongs to a course, used to check a reorder plan against.
#[derive(Debug, Default)]
pub struct CourseInventory {
    pub modules: HashSet<Uuid>,
    pub items: HashSet<ItemRef>,
}

impl CourseInventory {
    pub fn load(conn: &mut PgConnection, course_id: Uuid) -> QueryResult<Self> {
        let modules: Vec<Uuid> = course_modules::table
            .filter(course_modules::course_id.eq(course_id))
            .select(course_modules::id)
            .load(conn)?;

        let lesson_ids: Vec<Uuid> = lessons::table
            .filter(lessons::module_id.eq_any(&modules))
            .select(lessons::id)
            .load(conn)?;
        let quiz_ids: Vec<Uuid> = quizzes::table
            .filter(quizzes::module_id.eq_any(&modules))
            .select(quizzes::id)
            .load(conn)?;
        let assignment_ids: Vec<Uuid> = assignments::table
            .filter(assignments::module_id.eq_any(&modules))
            .select(assignments::id)
            .load(conn)?;

        let items = lesson_ids
            .into_iter()
            .map(|id| ItemRef { kind: ContentKind::Lesson, id })
            .chain(quiz_ids.into_iter().map(|id| ItemRef { kind: ContentKind::Quiz, id }))
            .chain(
                assignment_ids
                    .into_iter()
                    .map(|id| ItemRef { kind: ContentKind::Assignment, id }),
            )
            .collect();

        Ok(Self {
            modules: modules.into_iter().collect(),
            items,
        })
    }
}

/// The plan must list every module and item of the course exactly once.
pub fn validate_plan(plan: &ReorderRequest, inventory: &CourseInventory) -> ApiResult<()> {
    if plan.modules.is_empty() {
        return Err(ApiError::validation("Reorder plan must list at least one module"));
    }

    let mut seen_modules = HashSet::new();
    let mut seen_items = HashSet::new();

    for module in &plan.modules {
        if !inventory.modules.contains(&module.id) {
            return Err(ApiError::validation(format!(
                "Module {} does not belong to this course",
                module.id
            )));
        }
        if !seen_modules.insert(module.id) {
            return Err(ApiError::validation(format!(
                "Module {} appears more than once",
                module.id
            )));
        }

        for item in &module.items {
            if !inventory.items.contains(item) {
                return Err(ApiError::validation(format!(
                    "{:?} {} does not belong to this course",
                    item.kind, item.id
                )));
            }
            if !seen_items.insert(*item) {
                return Err(ApiError::validation(format!(
                    "{:?} {} appears more than once",
                    item.kind, item.id
                )));
            }
        }
    }

    if seen_modules.len() != inventory.modules.len() {
        return Err(ApiError::validation(format!(
            "Reorder plan lists {} of {} modules",
            seen_modules.len(),
            inventory.modules.len()
        )));
    }
    if seen_items.len() != inventory.items.len() {
        return Err(ApiError::validation(format!(
            "Reorder plan lists {} of {} items",
            seen_items.len(),
            inventory.items.len()
        )));
    }

    Ok(())
}

/// Writes positions from a validated plan. Call inside a transaction.
pub fn apply_plan(conn: &mut PgConnection, plan: &ReorderRequest) -> QueryResult<()> {
    let now = Utc::now();

    for (module_pos, module) in plan.modules.iter().enumerate() {
        diesel::update(course_modules::table.find(module.id))
            .set((
                course_modules::module_order.eq(module_pos as i32 + 1),
                course_modules::updated_at.eq(now),
            ))
            .execute(conn)?;

        for (item_pos, item) in module.items.iter().enumerate() {
            let order = item_pos as i32 + 1;
            match item.kind {
                ContentKind::Lesson => diesel::update(lessons::table.find(item.id))
                    .set((
                        lessons::module_id.eq(module.id),
                        lessons::lesson_order.eq(order),
                        lessons::updated_at.eq(now),
                    ))
                    .execute(conn)?,
                ContentKind::Quiz => diesel::update(quizzes::table.find(item.id))
                    .set((
                        quizzes::module_id.eq(module.id),
                        quizzes::quiz_order.eq(order),
                        quizzes::updated_at.eq(now),
                    ))
                    .execute(conn)?,
                ContentKind::Assignment => diesel::update(assignments::table.find(item.id))
                    .set((
                        assignments::module_id.eq(module.id),
                        assignments::assignment_order.eq(order),
                        assignments::updated_at.eq(now),
                    ))
                    .execute(conn)?,
            };
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::courses::types::ModulePlan;

    fn lesson(id: Uuid) -> ItemRef {
        ItemRef { kind: ContentKind::Lesson, id }
    }

    fn inventory(modules: &[Uuid], items: &[ItemRef]) -> CourseInventory {
        CourseInventory {
            modules: modules.iter().copied().collect(),
            items: items.iter().copied().collect(),
        }
    }

    #[test]
    fn test_valid_plan_moves_item_between_modules() {
        let (m1, m2) = (Uuid::new_v4(), Uuid::new_v4());
        let (l1, l2) = (Uuid::new_v4(), Uuid::new_v4());
        let inv = inventory(&[m1, m2], &[lesson(l1), lesson(l2)]);

        let plan = ReorderRequest {
            modules: vec![
                ModulePlan { id: m2, items: vec![lesson(l2), lesson(l1)] },
                ModulePlan { id: m1, items: vec![] },
            ],
        };
        assert!(validate_plan(&plan, &inv).is_ok());
    }

    #[test]
    fn test_foreign_module_rejected() {
        let m1 = Uuid::new_v4();
        let inv = inventory(&[m1], &[]);
        let plan = ReorderRequest {
            modules: vec![ModulePlan { id: Uuid::new_v4(), items: vec![] }],
        };
        assert!(matches!(validate_plan(&plan, &inv), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let m1 = Uuid::new_v4();
        let inv = inventory(&[m1], &[]);
        let plan = ReorderRequest {
            modules: vec![
                ModulePlan { id: m1, items: vec![] },
                ModulePlan { id: m1, items: vec![] },
            ],
        };
        assert!(validate_plan(&plan, &inv).is_err());
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let (m1, m2, l1) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let inv = inventory(&[m1, m2], &[lesson(l1)]);
        let plan = ReorderRequest {
            modules: vec![
                ModulePlan { id: m1, items: vec![lesson(l1)] },
                ModulePlan { id: m2, items: vec![lesson(l1)] },
            ],
        };
        assert!(validate_plan(&plan, &inv).is_err());
    }

    #[test]
    fn test_item_kind_must_match() {
        let (m1, id) = (Uuid::new_v4(), Uuid::new_v4());
        let inv = inventory(&[m1], &[lesson(id)]);
        let plan = ReorderRequest {
            modules: vec![ModulePlan {
                id: m1,
                items: vec![ItemRef { kind: ContentKind::Quiz, id }],
            }],
        };
        assert!(validate_plan(&plan, &inv).is_err());
    }

    #[test]
    fn test_plan_missing_a_module_rejected() {
        let (m1, m2) = (Uuid::new_v4(), Uuid::new_v4());
        let inv = inventory(&[m1, m2], &[]);
        let plan = ReorderRequest {
            modules: vec![ModulePlan { id: m1, items: vec![] }],
        };
        assert!(matches!(validate_plan(&plan, &inv), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_plan_missing_an_item_rejected() {
        let (m1, l1, l2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let inv = inventory(&[m1], &[lesson(l1), lesson(l2)]);
        let plan = ReorderRequest {
            modules: vec![ModulePlan { id: m1, items: vec![lesson(l2)] }],
        };
        assert!(matches!(validate_plan(&plan, &inv), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_empty_plan_rejected() {
        let plan = ReorderRequest { modules: vec![] };
        assert!(validate_plan(&plan, &CourseInventory::default()).is_err());
    }
}
