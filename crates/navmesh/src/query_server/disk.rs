use crate::queries::{DiskCollisionQuery, DiskExpansionQuery};
use crate::status::QueryServerResult;
use crate::traversal::StaticDiskIntersector;

use super::{is_allowed, NavMeshQueryServer};

impl<'m> NavMeshQueryServer<'m> {
    /// Tests a static disk with a breadth-first propagation that ends at the first contact
    pub fn disk_collision(&mut self, query: &mut DiskCollisionQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let center = self.resolve_triangle(query.center_triangle.as_ref(), query.center, query.search_range);
        query.center_triangle = center.map(|triangle| triangle.to_safe_ptr());
        let Some(center) = center.filter(|triangle| is_allowed(triangle, query.terrain_type_mask)) else {
            return Ok(());
        };

        let collision = self.run_disk_collision_search(
            center,
            query.center,
            query.radius,
            query.terrain_type_mask,
            query.memory.enabled,
        );
        query.memory.count = self.propagation_count;
        query.collision = collision?;
        Ok(())
    }

    /// Grows a disk from `center` up to `radius_max`, stopping at the nearest contact
    pub fn disk_expansion(&mut self, query: &mut DiskExpansionQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let center = self.resolve_triangle(query.center_triangle.as_ref(), query.center, query.search_range);
        query.center_triangle = center.map(|triangle| triangle.to_safe_ptr());
        let Some(center) = center.filter(|triangle| is_allowed(triangle, query.terrain_type_mask)) else {
            return Ok(());
        };

        let disk = StaticDiskIntersector::new(query.center, query.radius_max);
        let search = self.run_edge_search(center, disk, query.terrain_type_mask, query.memory.enabled);
        query.memory.count = self.propagation_count;
        match search?.collision {
            None => {
                query.collision = false;
                query.result_radius = query.radius_max;
            }
            Some(collision) => {
                query.collision_pos = collision.pos;
                query.intersected_half_edge = Some(collision.half_edge.to_safe_ptr());
                query.result_radius = (collision.key.sqrt() - query.safety_dist).max(0.0);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::QueryBufferConfig;
    use crate::queries::{
        DiskCollisionQuery, DiskCollisionQueryResult, DiskExpansionQuery, DiskExpansionQueryResult,
        PropagationQueryMemory,
    };
    use crate::test_mesh_helpers::*;
    use crate::NavMeshQueryServer;
    use navmesh_common::{CellPos, Result, Vec3};

    fn v(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    #[test]
    fn test_disk_collision() -> Result<()> {
        let (manager, _) = create_manager_with(create_flat_square_mesh()?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        let mut query = DiskCollisionQuery::new(v(5.0, 5.0), 1.0);
        server.disk_collision(&mut query)?;
        assert_eq!(query.get_result(), DiskCollisionQueryResult::Fit);

        let mut query = DiskCollisionQuery::new(v(5.0, 5.0), 6.0);
        server.disk_collision(&mut query)?;
        assert_eq!(query.get_result(), DiskCollisionQueryResult::DoesNotFit);

        let mut query = DiskCollisionQuery::new(v(15.0, 5.0), 1.0);
        server.disk_collision(&mut query)?;
        assert_eq!(query.get_result(), DiskCollisionQueryResult::CenterOutside);

        let mut query = DiskCollisionQuery::new(v(5.0, 5.0), 1.0);
        query.terrain_type_mask = 0x4;
        server.disk_collision(&mut query)?;
        assert_eq!(query.get_result(), DiskCollisionQueryResult::CenterMaterialForbidden);
        Ok(())
    }

    #[test]
    fn test_disk_collision_across_cells() -> Result<()> {
        let (manager, _) = create_manager_with(create_grid_mesh(2, 2, 4.0, CellPos::ZERO)?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        // centered on the corner shared by the four cells
        let mut query = DiskCollisionQuery::new(v(4.0, 4.0), 3.5);
        query.memory = PropagationQueryMemory::enabled();
        server.disk_collision(&mut query)?;
        assert_eq!(query.get_result(), DiskCollisionQueryResult::Fit);
        assert!(query.memory.count > 8);
        assert_eq!(query.memory.count, server.propagation_triangles().len());

        let mut query = DiskCollisionQuery::new(v(4.0, 4.0), 4.5);
        server.disk_collision(&mut query)?;
        assert_eq!(query.get_result(), DiskCollisionQueryResult::DoesNotFit);
        Ok(())
    }

    #[test]
    fn test_disk_expansion() -> Result<()> {
        let (manager, _) = create_manager_with(create_corridor_mesh()?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        let mut query = DiskExpansionQuery::new(v(5.0, 5.0), 3.0);
        server.disk_expansion(&mut query)?;
        assert_eq!(query.get_result(), DiskExpansionQueryResult::CollisionFound);
        assert!((query.result_radius - (1.0 - query.safety_dist)).abs() < 1e-4);
        assert!((query.collision_pos.y - 5.0).abs() > 0.99);
        assert!(query.intersected_half_edge.is_some());

        let mut query = DiskExpansionQuery::new(v(5.0, 5.0), 0.5);
        server.disk_expansion(&mut query)?;
        assert_eq!(query.get_result(), DiskExpansionQueryResult::Fit);
        assert_eq!(query.result_radius, 0.5);

        let mut query = DiskExpansionQuery::new(v(5.0, 4.0), 0.5);
        server.disk_expansion(&mut query)?;
        assert_eq!(query.get_result(), DiskExpansionQueryResult::CannotExpand);

        let mut query = DiskExpansionQuery::new(v(5.0, 8.0), 0.5);
        server.disk_expansion(&mut query)?;
        assert_eq!(query.get_result(), DiskExpansionQueryResult::CenterOutside);
        Ok(())
    }
}
