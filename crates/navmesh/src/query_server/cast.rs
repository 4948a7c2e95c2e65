use navmesh_common::Vec3;

use crate::queries::{DiskCastQuery, RayCastQuery, SegmentCastQuery};
use crate::status::QueryServerResult;
use crate::traversal::{CapsuleIntersector, RayIntersector, SegmentIntersector};

use super::{is_allowed, normalized_2d, NavMeshQueryServer};

impl<'m> NavMeshQueryServer<'m> {
    pub fn ray_cast(&mut self, query: &mut RayCastQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let start = self.resolve_triangle(query.start_triangle.as_ref(), query.start_pos, query.search_range);
        query.start_triangle = start.map(|triangle| triangle.to_safe_ptr());
        let Some(start) = start.filter(|triangle| is_allowed(triangle, query.terrain_type_mask)) else {
            return Ok(());
        };

        let dir = normalized_2d(query.normalized_dir_2d);
        let dest = query.start_pos + Vec3::new(dir.x, dir.y, 0.0) * query.max_dist;
        let ray = RayIntersector::new(query.start_pos, dest);
        let search = self.run_edge_search(start, ray, query.terrain_type_mask, query.memory.enabled);
        query.memory.count = self.propagation_count;
        let search = search?;

        let output = self.cast_output(
            &search,
            start,
            query.start_pos,
            dir,
            query.max_dist,
            query.safety_dist,
            query.search_range,
        );
        query.set_output(output);
        Ok(())
    }

    /// Casts the disk, narrowed at its start when `adapt_query_to_start_position` is set
    /// and the start disk touches a border
    pub fn disk_cast(&mut self, query: &mut DiskCastQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let start = self.resolve_triangle(query.start_triangle.as_ref(), query.start_pos, query.search_range);
        query.start_triangle = start.map(|triangle| triangle.to_safe_ptr());
        let Some(start) = start.filter(|triangle| is_allowed(triangle, query.terrain_type_mask)) else {
            return Ok(());
        };

        let dir = normalized_2d(query.normalized_dir_2d);
        let capsule = if query.adapt_query_to_start_position {
            self.start_adapted_capsule(
                start,
                query.start_pos,
                dir,
                query.max_dist,
                query.radius,
                query.safety_dist,
                query.terrain_type_mask,
            )?
        } else {
            CapsuleIntersector::new(query.start_pos, dir, query.max_dist, query.radius)
        };
        let search = self.run_edge_search(start, capsule, query.terrain_type_mask, query.memory.enabled);
        query.memory.count = self.propagation_count;
        let search = search?;

        let output = self.cast_output(
            &search,
            start,
            query.start_pos,
            dir,
            query.max_dist,
            query.safety_dist,
            query.search_range,
        );
        query.set_output(output);
        Ok(())
    }

    pub fn segment_cast(&mut self, query: &mut SegmentCastQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let dir = normalized_2d(query.normalized_dir_2d);
        let segment = SegmentIntersector::new(query.start_pos, dir, query.max_dist, query.radius);
        (query.start_b, query.start_a) = segment.start_segment();
        let start = self.resolve_triangle(query.start_triangle.as_ref(), query.start_pos, query.search_range);
        query.start_triangle = start.map(|triangle| triangle.to_safe_ptr());
        let Some(start) = start.filter(|triangle| is_allowed(triangle, query.terrain_type_mask)) else {
            return Ok(());
        };

        let search = self.run_edge_search(start, segment, query.terrain_type_mask, query.memory.enabled);
        query.memory.count = self.propagation_count;
        let search = search?;

        let output = self.cast_output(
            &search,
            start,
            query.start_pos,
            dir,
            query.max_dist,
            query.safety_dist,
            query.search_range,
        );
        query.set_output(output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navmesh_common::Vec2;
    use crate::config::QueryBufferConfig;
    use crate::queries::CastQueryResult;
    use crate::test_mesh_helpers::*;
    use navmesh_common::Result;

    fn v(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    fn assert_near(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-3, "{} != {}", a, b);
    }

    #[test]
    fn test_disk_cast_along_border_adapts_to_start() -> Result<()> {
        let (manager, _) = create_manager_with(create_flat_square_mesh()?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        let mut query = DiskCastQuery::new(Vec3::new(1.0, 0.001, 0.0), 0.5, Vec2::X, 5.0);
        server.disk_cast(&mut query)?;
        assert_eq!(query.get_result(), CastQueryResult::MaxDistReached);
        assert_near(query.arrival_pos.x, 6.0);
        assert_near(query.arrival_pos.y, 0.001);
        assert!(query.arrival_triangle.is_some());
        assert!(query.consistent_result);

        let mut query = DiskCastQuery::new(Vec3::new(1.0, 0.001, 0.0), 0.5, Vec2::X, 5.0);
        query.adapt_query_to_start_position = false;
        server.disk_cast(&mut query)?;
        assert_eq!(query.get_result(), CastQueryResult::CannotMove);
        assert!(query.intersected_half_edge.is_some());
        Ok(())
    }

    #[test]
    fn test_disk_cast_stops_before_wall() -> Result<()> {
        let (manager, _) = create_manager_with(create_flat_square_mesh()?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        let mut query = DiskCastQuery::new(v(2.0, 5.0), 0.5, Vec2::X, 20.0);
        server.disk_cast(&mut query)?;
        assert_eq!(query.get_result(), CastQueryResult::ArrivalPosFound);
        assert_near(query.arrival_pos.x, 9.5 - query.safety_dist);
        assert_near(query.arrival_pos.y, 5.0);
        assert_near(query.collision_pos.x, 10.0);
        assert!(query.consistent_result);
        Ok(())
    }

    #[test]
    fn test_ray_cast_hits_corridor_end() -> Result<()> {
        let (manager, _) = create_manager_with(create_corridor_mesh()?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        let mut query = RayCastQuery::new(v(1.0, 5.0), Vec2::X, 20.0);
        server.ray_cast(&mut query)?;
        assert_eq!(query.get_result(), CastQueryResult::ArrivalPosFound);
        assert_near(query.collision_pos.x, 10.0);
        assert_near(query.arrival_pos.x, 10.0 - query.safety_dist);

        let mut query = RayCastQuery::new(v(1.0, 5.0), Vec2::Y, 0.5);
        server.ray_cast(&mut query)?;
        assert_eq!(query.get_result(), CastQueryResult::MaxDistReached);
        assert_near(query.arrival_pos.y, 5.5);

        let mut query = RayCastQuery::new(v(1.0, 5.0), Vec2::X, 3.0);
        query.terrain_type_mask = 0x2;
        server.ray_cast(&mut query)?;
        assert_eq!(query.get_result(), CastQueryResult::StartMaterialForbidden);
        Ok(())
    }

    #[test]
    fn test_ray_cast_from_outside() -> Result<()> {
        let (manager, _) = create_manager_with(create_corridor_mesh()?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        let mut query = RayCastQuery::new(v(5.0, 2.0), Vec2::Y, 3.0);
        server.ray_cast(&mut query)?;
        assert_eq!(query.get_result(), CastQueryResult::StartOutside);
        Ok(())
    }

    #[test]
    fn test_segment_cast_in_corridor() -> Result<()> {
        let (manager, _) = create_manager_with(create_corridor_mesh()?);
        let mut server = NavMeshQueryServer::with_config(&manager, &QueryBufferConfig::default())?;

        let mut query = SegmentCastQuery::new(v(1.0, 5.0), 0.9, Vec2::X, 4.0);
        server.segment_cast(&mut query)?;
        assert_eq!(query.get_result(), CastQueryResult::MaxDistReached);
        assert_near(query.arrival_pos.x, 5.0);
        assert_near(query.start_a.y, 5.9);
        assert_near(query.start_b.y, 4.1);

        // turned toward the wall the segment spans the whole corridor width
        let mut query = SegmentCastQuery::new(v(5.0, 5.0), 0.5, Vec2::Y, 4.0);
        server.segment_cast(&mut query)?;
        assert_eq!(query.get_result(), CastQueryResult::ArrivalPosFound);
        assert_near(query.arrival_pos.y, 6.0 - query.safety_dist);
        Ok(())
    }
}
